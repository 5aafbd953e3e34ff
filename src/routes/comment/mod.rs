mod handler;
mod model;

pub use handler::{
    create_photo_comment, delete_comment, list_comments, list_photo_comments, set_comment_hidden,
};
pub use model::{Comment, CreateCommentRequest, SetHiddenRequest};
