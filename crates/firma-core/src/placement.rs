//! Signature placement
//!
//! Computes where a signature goes relative to its anchor text and paints it
//! onto the page as an image XObject.

use crate::config::PlacementConfig;
use crate::error::{FirmaError, Result};
use crate::geometry::Rect;
use crate::image_cache::SignatureImage;
use crate::pdf::{inherited, page_box, resolve, resolve_dict};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::PathBuf;

const IMAGE_NAME_PREFIX: &str = "FirmaImg";

/// Destination of a signature: `width × height`, centered horizontally on
/// the anchor and sitting `top_margin` above its top edge.
///
/// Rectangles use the top-left page space of [`crate::geometry`].
pub fn destination_rect(anchor: &Rect, config: &PlacementConfig) -> Rect {
    let width = f64::from(config.width_px);
    let height = f64::from(config.height_px);
    let x0 = anchor.x0 + (anchor.width() - width) / 2.0;
    let y1 = anchor.y0 - f64::from(config.top_margin_px);
    Rect::new(x0, y1 - height, x0 + width, y1)
}

/// Places signatures into one document.
///
/// Each source image is embedded once per document, and a page's original
/// content is wrapped in `q … Q` before the first signature is drawn on it.
#[derive(Debug)]
pub struct SignaturePlacer {
    config: PlacementConfig,
    embedded: HashMap<PathBuf, ObjectId>,
    isolated_pages: HashSet<ObjectId>,
}

impl SignaturePlacer {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            config,
            embedded: HashMap::new(),
            isolated_pages: HashSet::new(),
        }
    }

    /// Number of distinct images embedded so far.
    pub fn embedded_count(&self) -> usize {
        self.embedded.len()
    }

    /// Overlay `image` above `anchor` on `page_id`; returns the destination rectangle.
    pub fn place(
        &mut self,
        doc: &mut Document,
        page_id: ObjectId,
        image: &SignatureImage,
        anchor: &Rect,
    ) -> Result<Rect> {
        let destination = destination_rect(anchor, &self.config);
        let (x, y, width, height) = page_box(doc, page_id).to_user_space(&destination);

        let image_id = match self.embedded.get(&image.path) {
            Some(id) => *id,
            None => {
                let id = embed_image(doc, image)?;
                self.embedded.insert(image.path.clone(), id);
                id
            }
        };

        let name = register_xobject(doc, page_id, image_id)?;

        let draw = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(width as f32),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(height as f32),
                        Object::Real(x as f32),
                        Object::Real(y as f32),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let draw_bytes = draw
            .encode()
            .map_err(|e| FirmaError::Placement(format!("cannot encode drawing: {}", e)))?;

        let isolate = self.isolated_pages.insert(page_id);
        append_content(doc, page_id, draw_bytes, isolate)?;
        Ok(destination)
    }
}

/// Add `image` to the document as a Flate-compressed DeviceRGB image XObject.
pub fn embed_image(doc: &mut Document, image: &SignatureImage) -> Result<ObjectId> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(image.pixels.as_raw())
        .map_err(|e| FirmaError::Placement(format!("cannot compress image: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| FirmaError::Placement(format!("cannot compress image: {}", e)))?;

    Ok(doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        compressed,
    )))
}

/// Give the page its own resource dictionary (inherited and indirect entries
/// copied in) holding `image_id` under a fresh name, and return that name.
fn register_xobject(doc: &mut Document, page_id: ObjectId, image_id: ObjectId) -> Result<String> {
    let mut resources = match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(doc, x))
        .cloned()
        .unwrap_or_default();

    let name = (1..)
        .map(|n| format!("{}{}", IMAGE_NAME_PREFIX, n))
        .find(|candidate| !xobjects.has(candidate.as_bytes()))
        .unwrap_or_else(|| IMAGE_NAME_PREFIX.to_string());
    xobjects.set(name.as_bytes().to_vec(), Object::Reference(image_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// Append `draw` to the page content; with `isolate`, wrap the existing
/// content in `q … Q` first so its graphics state cannot leak into ours.
fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    draw: Vec<u8>,
    isolate: bool,
) -> Result<()> {
    let existing: Vec<Object> = {
        let page = page_dict_mut(doc, page_id)?;
        match page.remove(b"Contents") {
            Some(Object::Array(items)) => items,
            Some(Object::Reference(id)) => vec![Object::Reference(id)],
            Some(Object::Stream(stream)) => vec![Object::Stream(stream)],
            Some(_) | None => Vec::new(),
        }
    };
    // A reference may point to an array of streams rather than a stream.
    let existing: Vec<Object> = existing
        .into_iter()
        .flat_map(|item| {
            let nested = match resolve(doc, &item) {
                Some(Object::Array(inner)) => Some(inner.clone()),
                _ => None,
            };
            nested.unwrap_or_else(|| vec![item])
        })
        .collect();
    let existing: Vec<Object> = existing
        .into_iter()
        .map(|item| match item {
            Object::Stream(stream) => Object::Reference(doc.add_object(stream)),
            other => other,
        })
        .collect();

    let mut contents = Vec::with_capacity(existing.len() + 3);
    if isolate && !existing.is_empty() {
        let open = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let close = doc.add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec()));
        contents.push(Object::Reference(open));
        contents.extend(existing);
        contents.push(Object::Reference(close));
    } else {
        contents.extend(existing);
    }
    let draw_id = doc.add_object(Stream::new(dictionary! {}, draw));
    contents.push(Object::Reference(draw_id));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| FirmaError::Placement(format!("malformed page {:?}: {}", page_id, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{page_resources, stream_bytes};
    use flate2::read::ZlibDecoder;
    use image::{Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use std::io::Read;

    fn signature(path: &str) -> SignatureImage {
        SignatureImage {
            path: PathBuf::from(path),
            pixels: RgbImage::from_pixel(3, 2, Rgb([0, 0, 255])),
        }
    }

    fn single_page_doc() -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 1 rg".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! { "Font" => dictionary! {} },
            }),
        );
        (doc, page_id)
    }

    fn contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
        match doc.get_object(page_id).unwrap().as_dict().unwrap().get(b"Contents") {
            Ok(Object::Array(items)) => items.clone(),
            other => panic!("unexpected contents {other:?}"),
        }
    }

    fn stream_text(doc: &Document, obj: &Object) -> String {
        let id = obj.as_reference().unwrap();
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        String::from_utf8_lossy(&stream_bytes(stream)).into_owned()
    }

    #[test]
    fn test_destination_centered_above_anchor() {
        let anchor = Rect::new(100.0, 200.0, 300.0, 220.0);
        let config = PlacementConfig::new(120, 40, 0);
        // 100 + (200 - 120) / 2 = 140
        assert_eq!(
            destination_rect(&anchor, &config),
            Rect::new(140.0, 160.0, 260.0, 200.0)
        );
    }

    #[test]
    fn test_negative_margin_overlaps_text() {
        let anchor = Rect::new(100.0, 200.0, 300.0, 220.0);
        let config = PlacementConfig::new(200, 50, -10);
        assert_eq!(
            destination_rect(&anchor, &config),
            Rect::new(100.0, 160.0, 300.0, 210.0)
        );
    }

    #[test]
    fn test_place_wraps_content_and_draws() {
        let (mut doc, page_id) = single_page_doc();
        let mut placer = SignaturePlacer::new(PlacementConfig::new(120, 40, 0));
        let dest = placer
            .place(
                &mut doc,
                page_id,
                &signature("a.png"),
                &Rect::new(100.0, 200.0, 300.0, 220.0),
            )
            .unwrap();
        assert_eq!(dest, Rect::new(140.0, 160.0, 260.0, 200.0));

        let items = contents(&doc, page_id);
        assert_eq!(items.len(), 4);
        assert_eq!(stream_text(&doc, &items[0]).trim(), "q");
        assert_eq!(stream_text(&doc, &items[1]), "0 0 1 rg");
        assert_eq!(stream_text(&doc, &items[2]).trim(), "Q");

        let draw = Content::decode(stream_text(&doc, &items[3]).as_bytes()).unwrap();
        let cm = &draw.operations[1];
        assert_eq!(cm.operator, "cm");
        let values: Vec<f64> = cm
            .operands
            .iter()
            .filter_map(crate::pdf::number)
            .collect();
        // 792 - 200 = 592 is the bottom edge in user space.
        assert_eq!(values, vec![120.0, 0.0, 0.0, 40.0, 140.0, 592.0]);
        assert_eq!(draw.operations[2].operator, "Do");

        // Inherited resources were copied onto the page and extended.
        let resources = page_resources(&doc, page_id).unwrap();
        assert!(resources.has(b"Font"));
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert!(xobjects.has(b"FirmaImg1"));
    }

    #[test]
    fn test_same_image_embedded_once_per_document() {
        let (mut doc, page_id) = single_page_doc();
        let mut placer = SignaturePlacer::new(PlacementConfig::default());
        let image = signature("a.png");
        let anchor = Rect::new(100.0, 300.0, 200.0, 312.0);

        placer.place(&mut doc, page_id, &image, &anchor).unwrap();
        placer.place(&mut doc, page_id, &image, &anchor).unwrap();
        placer
            .place(&mut doc, page_id, &signature("b.png"), &anchor)
            .unwrap();

        assert_eq!(placer.embedded_count(), 2);
        // Original content wrapped once: q, original, Q and three drawings.
        assert_eq!(contents(&doc, page_id).len(), 6);
        let resources = page_resources(&doc, page_id).unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(xobjects.len(), 3);
    }

    #[test]
    fn test_embedded_image_dictionary() {
        let mut doc = Document::with_version("1.7");
        let id = embed_image(&mut doc, &signature("a.png")).unwrap();
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 3);
        assert_eq!(stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceRGB");
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
        let mut pixels = Vec::new();
        ZlibDecoder::new(stream.content.as_slice())
            .read_to_end(&mut pixels)
            .unwrap();
        assert_eq!(pixels, [0u8, 0, 255].repeat(6));
    }
}
