pub mod attachment;
pub mod comment;
pub mod item;
pub mod timestamp;

pub use attachment::{Attachment, AttachmentKind};
pub use comment::Comment;
pub use item::{ItemDraft, ItemPatch, ProjectItem, ValidationError};
