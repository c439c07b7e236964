//! Unit tests for the deferred deletion queue
//!
//! Handles are built directly from names; nothing here touches GL.

use std::num::NonZeroU32;
use std::sync::Arc;

use gek_engine::gek::video::ResourceId;

use crate::opengl_deletion::{deleted_texture_ids, DeletionQueue, GlObject};

fn name(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap()
}

#[test]
fn test_take_returns_in_push_order_and_empties() {
    let queue = DeletionQueue::new();
    queue.push(GlObject::Buffer(glow::NativeBuffer(name(1))));
    queue.push(GlObject::Program(glow::NativeProgram(name(2))));
    assert_eq!(queue.len(), 2);

    let taken = queue.take();
    assert_eq!(
        taken,
        vec![
            GlObject::Buffer(glow::NativeBuffer(name(1))),
            GlObject::Program(glow::NativeProgram(name(2))),
        ]
    );
    assert!(queue.is_empty());
    assert!(queue.take().is_empty());
}

#[test]
fn test_push_from_other_threads() {
    let queue = Arc::new(DeletionQueue::new());
    let handles: Vec<_> = (1..=4)
        .map(|index| {
            let queue = queue.clone();
            std::thread::spawn(move || queue.push(GlObject::Sampler(glow::NativeSampler(name(index)))))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(queue.take().len(), 4);
}

#[test]
fn test_deleted_texture_ids() {
    let first = ResourceId::next();
    let second = ResourceId::next();
    let objects = [
        GlObject::Texture(first, glow::NativeTexture(name(5))),
        GlObject::Query(glow::NativeQuery(name(6))),
        GlObject::Texture(second, glow::NativeTexture(name(7))),
    ];
    assert_eq!(deleted_texture_ids(&objects), vec![first, second]);
}
