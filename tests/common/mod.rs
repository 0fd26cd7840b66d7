#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Two images (one 40x20 with two boxes, one 10x10 without any) and two
/// categories with out-of-order ids.
pub const SMALL_COCO: &str = r#"{
    "images": [
        {"id": 7, "width": 40, "height": 20, "file_name": "boxes.bmp"},
        {"id": 8, "width": 10, "height": 10, "file_name": "empty.bmp"}
    ],
    "categories": [
        {"id": 5, "name": "a"},
        {"id": 2, "name": "b"}
    ],
    "annotations": [
        {"id": 1, "image_id": 7, "category_id": 5, "bbox": [10, 10, 50, 40]},
        {"id": 2, "image_id": 7, "category_id": 2, "bbox": [1, 2, 3, 4]}
    ]
}"#;

/// Lays out `{root}/annotations/instances_{split}.json` and one blank BMP per
/// image of [`SMALL_COCO`].
pub fn write_small_coco(root: &Path, split: &str) {
    let annotations = root.join("annotations");
    fs::create_dir_all(&annotations).expect("create annotations dir");
    fs::write(annotations.join(format!("instances_{split}.json")), SMALL_COCO)
        .expect("write annotation file");

    let images = root.join("images").join(split);
    write_bmp(&images.join("boxes.bmp"), 40, 20);
    write_bmp(&images.join("empty.bmp"), 10, 10);
}

/// Writes a RarePlanes label file with one object per `(category, box)`.
pub fn write_rareplanes_label(path: &Path, filename: &str, objects: &[(&str, [u32; 4])]) {
    let mut xml = format!(
        "<annotation>\n  <filename>{filename}</filename>\n  <num_object_mask_objects>{}</num_object_mask_objects>\n",
        objects.len()
    );
    for (category, [xmin, ymin, xmax, ymax]) in objects {
        xml.push_str(&format!(
            "  <object>\n    <category1>{category}</category1>\n    <bndbox2D><xmin>{xmin}</xmin><ymin>{ymin}</ymin><xmax>{xmax}</xmax><ymax>{ymax}</ymax></bndbox2D>\n  </object>\n"
        ));
    }
    xml.push_str("</annotation>\n");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, xml).expect("write label file");
}
