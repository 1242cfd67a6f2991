//! UI components.

pub mod tx_graph;
