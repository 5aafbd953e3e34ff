mod handler;
mod model;
mod upload;

pub use handler::{
    PhotoGroupResponse, create_photo, delete_photo, get_photo, list_photos, photo_groups,
    photo_siblings, update_photo,
};
pub use model::{GeoPoint, Photo, UpdatePhotoRequest};
