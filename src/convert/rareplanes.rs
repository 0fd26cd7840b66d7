//! RarePlanes XML label reader and CSV row writer.
//!
//! Each XML file describes one image:
//!
//! ```xml
//! <annotation>
//!   <filename>img_0001.png</filename>
//!   <num_object_mask_objects>2</num_object_mask_objects>
//!   <object>
//!     <category1>Small Civil Transport/Utility</category1>
//!     <bndbox2D>
//!       <xmin>10</xmin><ymin>12</ymin><xmax>40</xmax><ymax>44</ymax>
//!     </bndbox2D>
//!   </object>
//! </annotation>
//! ```
//!
//! Every object becomes one headerless CSV row
//! `image_path,xmin,ymin,xmax,ymax,category`. Coordinates are copied as text,
//! not reparsed, so the CSV reproduces the XML values exactly.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use roxmltree::Node;

use crate::error::RetinaError;

/// One parsed XML label file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RarePlanesLabel {
    pub filename: String,
    /// Object count declared by the file. Not checked against `objects`.
    pub num_objects: String,
    pub objects: Vec<RarePlanesObject>,
}

/// One `<object>` entry, values kept as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RarePlanesObject {
    pub category: String,
    pub xmin: String,
    pub ymin: String,
    pub xmax: String,
    pub ymax: String,
}

impl RarePlanesObject {
    /// CSV record for this object with `image_path` in the first column.
    pub fn to_record<'a>(&'a self, image_path: &'a str) -> [&'a str; 6] {
        [
            image_path,
            &self.xmin,
            &self.ymin,
            &self.xmax,
            &self.ymax,
            &self.category,
        ]
    }
}

/// Reads and parses one XML label file.
pub fn read_rareplanes_xml(path: &Path) -> Result<RarePlanesLabel, RetinaError> {
    let xml = fs::read_to_string(path).map_err(RetinaError::Io)?;
    parse_rareplanes_xml_str(&xml, path)
}

/// Fuzz-only entrypoint: parses XML from bytes and returns the number of
/// objects found.
#[cfg(feature = "fuzzing")]
pub fn from_rareplanes_xml_slice(bytes: &[u8]) -> Result<usize, RetinaError> {
    let path = Path::new("<memory>");
    let xml = std::str::from_utf8(bytes).map_err(|source| RetinaError::RarePlanesXmlParse {
        path: path.to_path_buf(),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    Ok(parse_rareplanes_xml_str(xml, path)?.objects.len())
}

/// Parses one XML document. `path` is only used in error messages.
pub fn parse_rareplanes_xml_str(xml: &str, path: &Path) -> Result<RarePlanesLabel, RetinaError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| RetinaError::RarePlanesXmlParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let root = document.root_element();
    let filename = required_child_text(root, "filename", path, "root element")?;
    let num_objects = required_child_text(root, "num_object_mask_objects", path, "root element")?;

    let mut objects = Vec::new();
    for object in root
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        let category = required_child_text(object, "category1", path, "<object>")?;
        let bndbox = child_element(object, "bndbox2D").ok_or_else(|| {
            RetinaError::RarePlanesXmlParse {
                path: path.to_path_buf(),
                message: "missing <bndbox2D> in <object>".to_string(),
            }
        })?;

        objects.push(RarePlanesObject {
            category,
            xmin: required_child_text(bndbox, "xmin", path, "<bndbox2D>")?,
            ymin: required_child_text(bndbox, "ymin", path, "<bndbox2D>")?,
            xmax: required_child_text(bndbox, "xmax", path, "<bndbox2D>")?,
            ymax: required_child_text(bndbox, "ymax", path, "<bndbox2D>")?,
        });
    }

    Ok(RarePlanesLabel {
        filename,
        num_objects,
        objects,
    })
}

/// Appends one row per object of every XML file to `out_csv`.
///
/// The image path column is `images_prefix` immediately followed by the
/// XML's `<filename>`; the prefix is expected to end with a separator.
/// Files are processed in the order given. Returns the number of rows
/// written.
pub fn make_label_file(
    images_prefix: &str,
    xml_files: &[PathBuf],
    out_csv: &Path,
) -> Result<usize, RetinaError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(out_csv)
        .map_err(RetinaError::Io)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);

    let mut rows = 0;
    for xml_file in xml_files {
        let label = read_rareplanes_xml(xml_file)?;
        let image_path = format!("{images_prefix}{}", label.filename);
        debug!(
            "{}: {} object(s) for {}",
            xml_file.display(),
            label.objects.len(),
            image_path
        );

        for object in &label.objects {
            writer
                .write_record(object.to_record(&image_path))
                .map_err(|source| RetinaError::CsvWrite {
                    path: out_csv.to_path_buf(),
                    source,
                })?;
            rows += 1;
        }
    }

    writer
        .into_inner()
        .map_err(|e| RetinaError::Io(e.into_error()))?
        .flush()
        .map_err(RetinaError::Io)?;

    Ok(rows)
}

fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, RetinaError> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| RetinaError::RarePlanesXmlParse {
            path: path.to_path_buf(),
            message: format!("missing <{tag}> in {context}"),
        })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PLANES: &str = r#"<?xml version="1.0"?>
<annotation>
  <filename>104_1040010044D2A400_tile_48.png</filename>
  <num_object_mask_objects>2</num_object_mask_objects>
  <object>
    <category1>Small Civil Transport/Utility</category1>
    <bndbox2D>
      <xmin>10.5</xmin>
      <ymin>12</ymin>
      <xmax>40</xmax>
      <ymax>44</ymax>
    </bndbox2D>
  </object>
  <object>
    <category1>Medium Civil Transport/Utility</category1>
    <bndbox2D>
      <xmin>100</xmin>
      <ymin>120</ymin>
      <xmax>180</xmax>
      <ymax>200</ymax>
    </bndbox2D>
  </object>
</annotation>"#;

    #[test]
    fn parse_extracts_objects_as_text() {
        let label = parse_rareplanes_xml_str(TWO_PLANES, Path::new("a.xml")).unwrap();
        assert_eq!(label.filename, "104_1040010044D2A400_tile_48.png");
        assert_eq!(label.num_objects, "2");
        assert_eq!(label.objects.len(), 2);
        assert_eq!(label.objects[0].xmin, "10.5");
        assert_eq!(label.objects[1].category, "Medium Civil Transport/Utility");
    }

    #[test]
    fn record_column_order() {
        let label = parse_rareplanes_xml_str(TWO_PLANES, Path::new("a.xml")).unwrap();
        let record = label.objects[0].to_record("imgs/x.png");
        assert_eq!(
            record,
            ["imgs/x.png", "10.5", "12", "40", "44", "Small Civil Transport/Utility"]
        );
    }

    #[test]
    fn missing_required_fields_are_errors() {
        let no_count = "<annotation><filename>a.png</filename></annotation>";
        let err = parse_rareplanes_xml_str(no_count, Path::new("a.xml")).unwrap_err();
        assert!(err.to_string().contains("num_object_mask_objects"));

        let no_box = "<annotation><filename>a.png</filename><num_object_mask_objects>1</num_object_mask_objects><object><category1>x</category1></object></annotation>";
        let err = parse_rareplanes_xml_str(no_box, Path::new("a.xml")).unwrap_err();
        assert!(err.to_string().contains("bndbox2D"));
    }

    #[test]
    fn file_without_objects_yields_no_rows() {
        let xml = "<annotation><filename>a.png</filename><num_object_mask_objects>0</num_object_mask_objects></annotation>";
        let label = parse_rareplanes_xml_str(xml, Path::new("a.xml")).unwrap();
        assert!(label.objects.is_empty());
    }

    #[cfg(feature = "fuzzing")]
    #[test]
    fn byte_entrypoint_rejects_invalid_utf8() {
        let xml = "<annotation><filename>a.png</filename><num_object_mask_objects>0</num_object_mask_objects></annotation>";
        assert_eq!(from_rareplanes_xml_slice(xml.as_bytes()).unwrap(), 0);
        assert!(from_rareplanes_xml_slice(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn make_label_file_appends_rows() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let xml_path = temp.path().join("a.xml");
        fs::write(&xml_path, TWO_PLANES).unwrap();
        let out = temp.path().join("out.csv");

        let rows = make_label_file("/data/images/", &[xml_path.clone()], &out).unwrap();
        assert_eq!(rows, 2);
        make_label_file("/data/images/", &[xml_path], &out).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "/data/images/104_1040010044D2A400_tile_48.png,10.5,12,40,44,Small Civil Transport/Utility"
        );
    }
}
