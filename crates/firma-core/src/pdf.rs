//! lopdf object helpers shared by text extraction and placement.

use crate::geometry::PageBox;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Longest reference chain or page-tree ancestry followed before giving up.
const MAX_INDIRECTION: usize = 32;

/// Follow references until a direct object is reached.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_INDIRECTION {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

pub fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

pub fn resolve_array<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Vec<Object>> {
    match resolve(doc, obj)? {
        Object::Array(items) => Some(items),
        _ => None,
    }
}

/// `dict[key]`, dereferenced.
pub fn lookup<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    resolve(doc, dict.get(key).ok()?)
}

pub fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

pub fn lookup_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    number(lookup(doc, dict, key)?)
}

pub fn name(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::Name(n) => Some(n.as_slice()),
        _ => None,
    }
}

/// Decoded stream bytes; streams without a usable filter are returned raw.
pub fn stream_bytes(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

/// Page dictionary by object id.
pub fn page_dict(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    match doc.get_object(page_id).ok()? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Inheritable page attribute (`Resources`, `MediaBox`, `CropBox`, `Rotate`),
/// searched on the page and then up the page tree.
pub fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut dict = page_dict(doc, page_id)?;
    for _ in 0..MAX_INDIRECTION {
        if let Some(value) = lookup(doc, dict, key) {
            return Some(value);
        }
        dict = resolve_dict(doc, dict.get(b"Parent").ok()?)?;
    }
    None
}

/// Visible area of the page: CropBox, else MediaBox, else US Letter.
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    [b"CropBox".as_slice(), b"MediaBox".as_slice()]
        .iter()
        .find_map(|key| box_from(doc, inherited(doc, page_id, key)?))
        .unwrap_or(PageBox::LETTER)
}

fn box_from(doc: &Document, obj: &Object) -> Option<PageBox> {
    let items = match obj {
        Object::Array(items) => items,
        _ => return None,
    };
    if items.len() != 4 {
        return None;
    }
    let mut corners = [0.0; 4];
    for (slot, item) in corners.iter_mut().zip(items) {
        *slot = number(resolve(doc, item)?)?;
    }
    let page_box = PageBox::from_corners(corners);
    (page_box.width() > 0.0 && page_box.height() > 0.0).then_some(page_box)
}

/// Effective resources of a page, with inheritance applied.
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    match inherited(doc, page_id, b"Resources")? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_page_box_inherits_media_box() {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );

        let page_box = page_box(&doc, page_id);
        assert_eq!(page_box.width(), 595.0);
        assert_eq!(page_box.height(), 842.0);
    }

    #[test]
    fn test_crop_box_preferred() {
        let mut doc = Document::with_version("1.7");
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "CropBox" => vec![10.into(), 10.into(), 602.into(), 782.into()],
        });
        let page_box = page_box(&doc, page_id);
        assert_eq!(page_box.llx, 10.0);
        assert_eq!(page_box.ury, 782.0);
    }

    #[test]
    fn test_missing_box_falls_back_to_letter() {
        let mut doc = Document::with_version("1.7");
        let page_id = doc.add_object(dictionary! { "Type" => "Page" });
        assert_eq!(page_box(&doc, page_id), PageBox::LETTER);
    }

    #[test]
    fn test_resolve_follows_references() {
        let mut doc = Document::with_version("1.7");
        let target = doc.add_object(Object::Integer(42));
        let alias = doc.add_object(Object::Reference(target));
        let obj = Object::Reference(alias);
        assert_eq!(resolve(&doc, &obj).and_then(number), Some(42.0));
    }
}
