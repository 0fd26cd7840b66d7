use std::fs;

use retinakit::convert::{convert_dataset, convert_split, make_label_file, DEFAULT_SPLITS};
use retinakit::RetinaError;

mod common;

#[test]
fn two_objects_share_the_image_path() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let xml = temp.path().join("labels/a.xml");
    common::write_rareplanes_label(
        &xml,
        "a.png",
        &[("Small", [1, 2, 3, 4]), ("Large", [10, 20, 30, 40])],
    );
    let out = temp.path().join("out.csv");

    let rows = make_label_file("imgs/", &[xml], &out).expect("convert");
    assert_eq!(rows, 2);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(&out)
        .expect("open csv");
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("record")).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][0], "imgs/a.png");
    assert_eq!(&records[1][0], "imgs/a.png");
    assert_eq!(&records[0][5], "Small");
    assert_eq!(
        records[1].iter().collect::<Vec<_>>(),
        vec!["imgs/a.png", "10", "20", "30", "40", "Large"]
    );
}

#[test]
fn category_with_comma_is_quoted() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let xml = temp.path().join("a.xml");
    common::write_rareplanes_label(&xml, "a.png", &[("Civil, Large", [1, 2, 3, 4])]);
    let out = temp.path().join("out.csv");

    make_label_file("", &[xml], &out).expect("convert");
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text, "a.png,1,2,3,4,\"Civil, Large\"\r\n");
}

#[test]
fn whole_dataset_in_natural_order() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    for split in DEFAULT_SPLITS {
        for n in [1, 11, 3] {
            common::write_rareplanes_label(
                &root.join(split).join("labels").join(format!("tile_{n}.xml")),
                &format!("tile_{n}.png"),
                &[("plane", [n, n, n + 5, n + 5])],
            );
        }
    }

    let reports = convert_dataset(root, &DEFAULT_SPLITS).expect("convert dataset");
    assert_eq!(reports.len(), 3);

    for report in &reports {
        assert_eq!(report.xml_files, 3);
        assert_eq!(report.rows, 3);

        let text = fs::read_to_string(&report.csv_path).unwrap();
        let names: Vec<String> = text
            .lines()
            .map(|line| {
                let path = line.split(',').next().unwrap();
                path.rsplit('/').next().unwrap().to_string()
            })
            .collect();
        assert_eq!(names, vec!["tile_1.png", "tile_3.png", "tile_11.png"]);
    }
}

#[test]
fn failed_file_aborts_split() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let split_dir = temp.path().join("test");
    common::write_rareplanes_label(&split_dir.join("labels/1.xml"), "1.png", &[("p", [0, 0, 1, 1])]);
    fs::write(
        split_dir.join("labels/2.xml"),
        "<annotation><num_object_mask_objects>0</num_object_mask_objects></annotation>",
    )
    .unwrap();

    let err = convert_split(&split_dir).unwrap_err();
    match err {
        RetinaError::RarePlanesXmlParse { path, message } => {
            assert!(path.ends_with("2.xml"));
            assert!(message.contains("filename"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
