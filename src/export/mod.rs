pub mod deliver;
pub mod encode;
pub mod pipeline;
pub mod preload;
pub mod rasterize;

pub use deliver::{download_file_name, DownloadDir, FileSink};
pub use encode::{encode_png, PngPayload};
pub use pipeline::{ExportOutcome, ExportPipeline};
pub use preload::{HttpImageLoader, ImageCache, ImageLoader};
pub use rasterize::{CardSheetRasterizer, RasterOptions, Rasterizer};
