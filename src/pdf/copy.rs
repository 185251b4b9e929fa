//! Page-level copy between documents.
//!
//! A page is copied together with everything it references (content streams,
//! resources, annotations), renumbered into the target document. Attributes a
//! page inherits from its page tree ancestors are written onto the copy so it
//! stands alone under its new parent.

use crate::pdf::document::page_rotation;
use crate::rotation::Rotation;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};

const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Look up `key` on a page, falling back to its page tree ancestors.
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut visited = HashSet::new();
    let mut current = doc.get_dictionary(page_id).ok();

    while let Some(dict) = current {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
        if !visited.insert(parent) {
            return None;
        }
        current = doc.get_dictionary(parent).ok();
    }

    None
}

/// Copies pages out of one source document.
///
/// Objects shared between pages (fonts, images) are imported once per copier,
/// so extracting several pages of one source does not duplicate them. Every
/// `copy_page` call yields a distinct page dictionary, which lets the same
/// source page appear more than once with different rotations.
pub struct PageCopier<'a> {
    source: &'a Document,
    imported: HashMap<ObjectId, Object>,
}

impl<'a> PageCopier<'a> {
    pub fn new(source: &'a Document) -> Self {
        PageCopier {
            source,
            imported: HashMap::new(),
        }
    }

    /// Build a self-contained copy of `page_id`'s dictionary whose references
    /// point into `target`. The caller decides where the page is attached.
    pub fn copy_page(
        &mut self,
        target: &mut Document,
        page_id: ObjectId,
    ) -> Result<Dictionary, lopdf::Error> {
        let mut page = self.source.get_dictionary(page_id)?.clone();
        page.remove(b"Parent");

        for key in INHERITABLE {
            if page.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(self.source, page_id, key) {
                page.set(key.to_vec(), value.clone());
            }
        }

        // Copies carry /Rotate as a direct integer, or not at all
        page.remove(b"Rotate");
        let rotation = page_rotation(self.source, page_id);
        if rotation != Rotation::None {
            page.set("Rotate", rotation.degrees());
        }

        let mut copy = Dictionary::new();
        for (key, value) in page.iter() {
            copy.set(key.clone(), self.import(target, value));
        }
        Ok(copy)
    }

    fn import(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.import_reference(target, *id),
            Object::Array(items) => {
                Object::Array(items.iter().map(|o| self.import(target, o)).collect())
            }
            Object::Dictionary(dict) => Object::Dictionary(self.import_dictionary(target, dict)),
            Object::Stream(stream) => {
                let mut stream = stream.clone();
                stream.dict = self.import_dictionary(target, &stream.dict);
                Object::Stream(stream)
            }
            other => other.clone(),
        }
    }

    fn import_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut out = Dictionary::new();
        for (key, value) in dict.iter() {
            out.set(key.clone(), self.import(target, value));
        }
        out
    }

    fn import_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(mapped) = self.imported.get(&id) {
            return mapped.clone();
        }

        let source = self.source;
        let Ok(object) = source.get_object(id) else {
            return Object::Null;
        };

        // Links to other pages or to the page tree would drag the whole source
        // document along.
        if is_page_tree_node(object) {
            self.imported.insert(id, Object::Null);
            return Object::Null;
        }

        // Reserve the ID before recursing so cycles resolve to it.
        let new_id = target.new_object_id();
        self.imported.insert(id, Object::Reference(new_id));
        let copy = self.import(target, object);
        target.objects.insert(new_id, copy);
        Object::Reference(new_id)
    }
}

/// Turn a copied page by `delta` on top of whatever rotation it already had.
/// Returns the resulting rotation.
pub fn rotate_page(page: &mut Dictionary, delta: Rotation) -> Rotation {
    let current = page
        .get(b"Rotate")
        .and_then(Object::as_i64)
        .ok()
        .and_then(Rotation::from_degrees)
        .unwrap_or_default();
    let rotated = current.compose(delta);
    if rotated == Rotation::None {
        page.remove(b"Rotate");
    } else {
        page.set("Rotate", rotated.degrees());
    }
    rotated
}

fn is_page_tree_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        _ => return false,
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Page") | Ok(b"Pages")
    )
}
