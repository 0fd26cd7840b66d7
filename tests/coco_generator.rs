use ndarray::{Array3, Axis};
use retinakit::generator::{CocoGenerator, CocoGeneratorOptions, Generator};
use retinakit::ir::{CocoCategoryId, Label};
use retinakit::preprocess::{
    augment_batch, normalize, resize_image, scale_boxes, to_bgr_array, DataFormat,
    RandomTransformGenerator, ResizeConfig,
};
use retinakit::RetinaError;

mod common;

#[test]
fn generator_loads_images_and_annotations_from_disk() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_small_coco(temp.path(), "train");

    let gen = CocoGenerator::new(temp.path(), "train", &CocoGeneratorOptions::default())
        .expect("open split");
    assert_eq!(gen.size(), 1);
    assert_eq!(gen.num_classes(), 2);

    let image = gen.load_image(0).expect("decode image");
    assert_eq!(image.dimensions(), (40, 20));

    let annotations = gen.load_annotations(0).expect("load annotations");
    assert_eq!(annotations.row(0).to_vec(), vec![10.0, 10.0, 60.0, 50.0, 1.0]);
    assert_eq!(annotations.row(1).to_vec(), vec![1.0, 2.0, 4.0, 6.0, 0.0]);

    assert_eq!(gen.label_to_coco_label(Label(1)).unwrap(), CocoCategoryId(5));
    assert_eq!(gen.image_aspect_ratio(0).unwrap(), 2.0);
}

#[test]
fn keep_empty_exposes_unannotated_images() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_small_coco(temp.path(), "val");

    let gen = CocoGenerator::new(
        temp.path(),
        "val",
        &CocoGeneratorOptions {
            filter_empty_images: false,
        },
    )
    .expect("open split");
    assert_eq!(gen.size(), 2);
    assert!(matches!(
        gen.load_annotations(1),
        Err(RetinaError::NoAnnotations {
            index: 1,
            image_id: 8
        })
    ));
    assert_eq!(gen.load_image(1).expect("decode image").dimensions(), (10, 10));
}

#[test]
fn missing_annotation_file_is_io_error() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let err = CocoGenerator::new(temp.path(), "train", &CocoGeneratorOptions::default())
        .unwrap_err();
    assert!(matches!(err, RetinaError::Io(_)));
}

#[test]
fn malformed_annotation_file_is_parse_error() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dir = temp.path().join("annotations");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("instances_train.json"), "{ not json").unwrap();

    let err = CocoGenerator::new(temp.path(), "train", &CocoGeneratorOptions::default())
        .unwrap_err();
    assert!(matches!(err, RetinaError::CocoJsonParse { .. }));
}

#[test]
fn missing_image_file_is_decode_error() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_small_coco(temp.path(), "train");
    std::fs::remove_file(temp.path().join("images/train/boxes.bmp")).unwrap();

    let gen = CocoGenerator::new(temp.path(), "train", &CocoGeneratorOptions::default())
        .expect("open split");
    assert!(matches!(
        gen.load_image(0),
        Err(RetinaError::ImageDecode { .. })
    ));
}

#[test]
fn full_preprocessing_pipeline() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_small_coco(temp.path(), "train");
    let gen = CocoGenerator::new(temp.path(), "train", &CocoGeneratorOptions::default())
        .expect("open split");

    let mut images = vec![gen.load_image(0).expect("load image")];
    let annotations = gen.load_annotations(0).expect("load boxes");

    let mut boxes = Array3::<f64>::zeros((1, annotations.nrows(), 4));
    for (i, row) in annotations.rows().into_iter().enumerate() {
        for c in 0..4 {
            boxes[[0, i, c]] = row[c];
        }
    }

    // default parameters sample the identity; boxes come back rasterized
    let generator = RandomTransformGenerator::default();
    augment_batch(&mut images, &mut boxes, &generator, Some(3)).expect("augment");
    assert_eq!(
        boxes.index_axis(Axis(0), 0).row(1).to_vec(),
        vec![1.0, 2.0, 5.0, 7.0]
    );

    let (resized, scale) = resize_image(&images[0], &ResizeConfig::default()).expect("resize");
    assert_eq!(resized.dimensions(), (1024, 512));
    assert_eq!(scale, 25.6);

    let mut first = annotations.clone();
    scale_boxes(&mut first, scale);
    assert_eq!(first[[0, 4]], 1.0);

    let mut input = to_bgr_array(&resized);
    normalize(&mut input, DataFormat::ChannelsLast).expect("normalize");
    assert_eq!(input.shape(), &[512, 1024, 3]);
    assert!((input[[0, 0, 0]] + 103.939).abs() < 1e-4);
}
