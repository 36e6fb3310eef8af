mod photo;
mod rnc;

pub use photo::{NewPhoto, Photo, PhotoStage};
pub use rnc::{
    CancelRnc, CloseRnc, LifecycleAction, LifecycleHistory, NewRnc, ReopenRnc, Rnc, RncFilter, RncStatus,
    StatusChange,
};
