//! County case choropleth with an airport flight-network overlay.

mod choropleth;
mod component;
mod config;
mod error;
mod legend;
mod load;
mod network;
mod projection;
mod render;
mod scale;
mod scene;
mod slice;
mod state;
mod topology;
mod types;

pub use component::DashboardCanvas;
pub use config::DashboardConfig;
pub use error::DashboardError;
pub use load::load_bundle;
pub use types::DatasetBundle;
