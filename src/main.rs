use anyhow::{Context, bail};
use georaster_pipeline_rs::image_pipeline::{Bounds, ImageStats, LoadImageFromDisk, SaveImage, SegmentExt, Value};
use georaster_pipeline_rs::logger;

use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        bail!("usage: georaster_pipeline_rs <input.tif> <output.tif>");
    };

    info!("Starting georaster pipeline: {} -> {}", input, output);

    let pipeline = LoadImageFromDisk::new(&input)
        .verbose(true)
        .then(ImageStats::new())
        .then(SaveImage::new(&output))
        .then(Bounds);

    match pipeline.run().with_context(|| format!("processing {}", input))? {
        Value::Bounds(envelope) => info!("Saved {} with bounds {}", output, envelope),
        other => error!("Pipeline ended with unexpected {} value", other.kind()),
    }

    Ok(())
}
