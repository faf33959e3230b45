mod calendar;
mod distribution;
mod heat;
mod help;
mod loading;
mod pane;
mod rhythm;
mod summary;
mod trend;
mod weekly;

pub use calendar::*;
pub use distribution::*;
pub use help::*;
pub use loading::*;
pub use pane::*;
pub use rhythm::*;
pub use summary::*;
pub use trend::*;
pub use weekly::*;
