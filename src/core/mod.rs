pub mod sample;
pub mod series;
pub mod source;
pub mod window;

pub use sample::Sample;
pub use series::SeriesBuffer;
pub use source::ValueSource;
pub use window::{apply_window, WindowRange, WindowSpec, WindowView};
