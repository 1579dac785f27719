use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use georaster_pipeline_rs::image_pipeline::{
    DataType, Image, ImageStats, LoadImageFromMemory, Merge, MergeToStack, Metadata, Segment, SegmentExt,
    SelectBands, StatsOptions, Value,
};
use ndarray::Array3;

fn generate_image(bands: usize, size: usize) -> Image {
    let data = Array3::from_shape_fn((bands, size, size), |(b, r, c)| ((b * 31 + r * 7 + c) % 256) as f64);
    Image::new("bench", data.into_shared(), DataType::UInt8, Metadata::default())
}

fn benchmark_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats_by_size");
    let stats = ImageStats::with_options(
        StatsOptions::builder()
            .print_desc(false)
            .print_props(false)
            .return_image(false)
            .return_props(true)
            .build(),
    );

    for size in [128, 512, 1024] {
        let image = generate_image(3, size);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{size}x{size}")), &image, |b, image| {
            b.iter(|| stats.transform(black_box(Value::Image(image.clone()))));
        });
    }

    group.finish();
}

fn benchmark_select_bands(c: &mut Criterion) {
    let image = generate_image(8, 512);
    let select = SelectBands::new([7, 3, 0]);

    c.bench_function("select_bands_512", |b| {
        b.iter(|| select.transform(black_box(Value::Image(image.clone()))));
    });
}

fn benchmark_merge_to_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_to_stack");

    for branches in [2, 4, 8] {
        let image = generate_image(1, 512);
        let mut merge = Merge::from_branches(Vec::new());
        for _ in 0..branches {
            merge = merge.branch(LoadImageFromMemory::new(image.clone()));
        }
        let pipeline = merge.then(MergeToStack::default());

        group.bench_function(BenchmarkId::from_parameter(branches), |b| {
            b.iter(|| black_box(pipeline.run()));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_stats, benchmark_select_bands, benchmark_merge_to_stack);
criterion_main!(benches);
