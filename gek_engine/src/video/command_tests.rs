//! Unit tests for CommandRecorder and RecordedCommandList

use glam::Vec4;

use crate::gek::Error;
use crate::video::mock_device::{MockBuffer, MockContext, MockFence, MockPipelineState, MockTexture};
use crate::video::{
    BufferDescription, ClearFlags, CommandList, CommandRecorder, Context, Format, PipelineType,
    ResourceRef, TextureDescription, TextureFlags, Viewport,
};

fn record_frame(recorder: &mut CommandRecorder) {
    let pipeline = MockPipelineState::graphics("mesh");
    let vertices = MockBuffer::create(BufferDescription::vertex("vertices", 12, 3));
    let indices = MockBuffer::create(BufferDescription::index("indices", Format::R16_UINT, 3));
    let constants = MockBuffer::create(BufferDescription::constant("frame", 64));
    let target = MockTexture::create(TextureDescription::render_target("color", Format::R8G8B8A8_UNORM, 64, 64));

    recorder.set_pipeline_state(&pipeline).unwrap();
    recorder.set_vertex_buffer_list(&[Some(vertices)], 0, &[0]).unwrap();
    recorder.set_index_buffer(Some(&indices), 0).unwrap();
    recorder
        .set_constant_buffer_list(PipelineType::Vertex, &[Some(constants)], 1)
        .unwrap();
    recorder.set_render_target_list(&[target.clone()], None).unwrap();
    recorder.set_viewport_list(&[Viewport::new(64.0, 64.0)]).unwrap();
    recorder.clear_render_target(&target, Vec4::ZERO).unwrap();
    recorder.draw_indexed_primitive(3, 0, 0).unwrap();
}

// ============================================================================
// RECORDING
// ============================================================================

#[test]
fn test_recorder_is_deferred() {
    let recorder = CommandRecorder::new();
    assert!(recorder.is_deferred());
    assert!(recorder.is_empty());
}

#[test]
fn test_recorded_labels_in_order() {
    let mut recorder = CommandRecorder::new();
    record_frame(&mut recorder);

    let labels: Vec<_> = recorder.commands().iter().map(|command| command.label()).collect();
    assert_eq!(
        labels,
        vec![
            "SetPipelineState",
            "SetVertexBufferList",
            "SetIndexBuffer",
            "SetConstantBufferList",
            "SetRenderTargetList",
            "SetViewportList",
            "ClearRenderTarget",
            "DrawIndexedPrimitive",
        ]
    );
    assert_eq!(recorder.len(), 8);
}

#[test]
fn test_draw_without_pipeline_fails_at_record_time() {
    let mut recorder = CommandRecorder::new();
    let result = recorder.draw_primitive(3, 0);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(recorder.is_empty());
}

#[test]
fn test_indexed_draw_needs_index_buffer() {
    let mut recorder = CommandRecorder::new();
    recorder.set_pipeline_state(&MockPipelineState::graphics("mesh")).unwrap();
    assert!(recorder.draw_primitive(3, 0).is_ok());
    assert!(matches!(recorder.draw_indexed_primitive(3, 0, 0), Err(Error::InvalidResource(_))));
}

#[test]
fn test_dispatch_requires_compute_pipeline() {
    let mut recorder = CommandRecorder::new();
    recorder.set_pipeline_state(&MockPipelineState::graphics("mesh")).unwrap();
    assert!(matches!(recorder.dispatch(8, 8, 1), Err(Error::InvalidResource(_))));

    recorder.set_pipeline_state(&MockPipelineState::compute("blur")).unwrap();
    assert!(recorder.dispatch(8, 8, 1).is_ok());
    assert!(matches!(recorder.draw_primitive(3, 0), Err(Error::InvalidResource(_))));
}

#[test]
fn test_wrong_buffer_kind_rejected() {
    let mut recorder = CommandRecorder::new();
    let constants = MockBuffer::create(BufferDescription::constant("frame", 16));
    assert!(recorder.set_vertex_buffer_list(&[Some(constants.clone())], 0, &[0]).is_err());
    assert!(recorder.set_index_buffer(Some(&constants), 0).is_err());
    assert!(recorder.is_empty());
}

#[test]
fn test_rejected_list_binds_nothing() {
    let mut recorder = CommandRecorder::new();
    let constants = MockBuffer::create(BufferDescription::constant("frame", 16));
    let vertices = MockBuffer::create(BufferDescription::vertex("vertices", 12, 3));

    let result = recorder.set_constant_buffer_list(
        PipelineType::Vertex,
        &[Some(constants.clone()), Some(vertices.clone())],
        0,
    );
    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(recorder.binding_state().constant_buffers.is_empty());

    assert!(recorder
        .set_vertex_buffer_list(&[Some(vertices.clone()), Some(constants.clone())], 0, &[0, 0])
        .is_err());
    assert!(recorder.binding_state().vertex_buffers.is_empty());

    let writable = MockTexture::create(TextureDescription {
        flags: TextureFlags::RESOURCE | TextureFlags::UNORDERED_ACCESS,
        ..TextureDescription::texture_2d("writable", Format::R32_FLOAT, 4, 4)
    });
    let resources = [Some(ResourceRef::from(writable)), Some(ResourceRef::from(constants))];
    assert!(recorder.set_unordered_access_list(PipelineType::Compute, &resources, 0).is_err());
    assert!(recorder.binding_state().unordered_access.is_empty());

    // What the recorder tracks is what a replay produces
    let recorded_state = recorder.binding_state().clone();
    let list = recorder.finish();
    assert_eq!(list.command_count(), 0);
    let mut context = MockContext::new();
    list.replay(&mut context).unwrap();
    assert_eq!(context.binding_state(), &recorded_state);
}

#[test]
fn test_clear_checks_views() {
    let mut recorder = CommandRecorder::new();
    let plain = MockTexture::create(TextureDescription::texture_2d("plain", Format::R8G8B8A8_UNORM, 4, 4));
    assert!(recorder.clear_render_target(&plain, Vec4::ONE).is_err());
    assert!(recorder
        .clear_depth_stencil_target(&plain, ClearFlags::DEPTH, 1.0, 0)
        .is_err());
    assert!(recorder
        .clear_unordered_access_float(&ResourceRef::from(plain), Vec4::ZERO)
        .is_err());
}

#[test]
fn test_clear_state_unbinds() {
    let mut recorder = CommandRecorder::new();
    record_frame(&mut recorder);
    assert!(recorder.binding_state().pipeline.is_some());

    recorder.clear_state().unwrap();
    assert!(recorder.binding_state().pipeline.is_none());
    assert!(recorder.binding_state().render_targets.is_empty());
    assert!(recorder.draw_primitive(3, 0).is_err());
}

// ============================================================================
// FINISH AND REPLAY
// ============================================================================

#[test]
fn test_finish_resets_recorder() {
    let mut recorder = CommandRecorder::new();
    record_frame(&mut recorder);

    let list = recorder.finish_command_list().unwrap();
    assert_eq!(list.command_count(), 8);
    assert!(recorder.is_empty());
    assert!(recorder.binding_state().pipeline.is_none());

    // Bindings do not leak into the next list
    assert!(recorder.draw_primitive(3, 0).is_err());
}

#[test]
fn test_replay_reproduces_bindings() {
    let mut recorder = CommandRecorder::new();
    record_frame(&mut recorder);
    let recorded_state = recorder.binding_state().clone();
    let list = recorder.finish();

    let mut first = MockContext::new();
    list.replay(&mut first).unwrap();
    let mut second = MockContext::new();
    list.replay(&mut second).unwrap();

    assert_eq!(first.binding_state(), &recorded_state);
    assert_eq!(first.binding_state(), second.binding_state());
    assert_eq!(first.executed(), second.executed());
    assert_eq!(first.frame.draw_calls, 1);
}

#[test]
fn test_fence_recorded_not_signaled() {
    let mut recorder = CommandRecorder::new();
    let fence = MockFence::create();
    recorder.signal_fence(&fence).unwrap();
    assert_eq!(recorder.commands()[0].label(), "SignalFence");

    let list = recorder.finish();
    let mut context = MockContext::new();
    list.replay(&mut context).unwrap();
    assert_eq!(context.executed(), vec!["SignalFence"]);
}
