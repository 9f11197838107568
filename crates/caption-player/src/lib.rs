//! Frame-synchronized caption delivery.
//!
//! A decode thread pushes timestamped overlay samples into a [`queue::SampleQueue`]
//! registered with it by the consumer. Once per display frame the host calls
//! [`driver::CaptionDriver::tick`], which refreshes the producer binding, snapshots
//! playback rate/time and hands at most one ready caption to subscribers.

pub mod binding;
pub mod cache;
pub mod config;
pub mod driver;
pub mod events;
pub mod queue;
pub mod sample;
pub mod source;
pub mod status;
