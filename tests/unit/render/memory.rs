use pollster::block_on;

use super::*;

#[test]
fn open_unknown_locator_fails() {
    let backend = MemoryBackend::new();
    let err = block_on(backend.open(&"nope.pdf".into())).unwrap_err();
    assert!(err.to_string().contains("nope.pdf"));
}

#[test]
fn pages_are_one_indexed() {
    let backend =
        MemoryBackend::new().with_document("a.pdf", vec![PageSize::LETTER, PageSize::new(100.0, 50.0)]);
    let doc = block_on(backend.open(&"a.pdf".into())).unwrap();
    assert_eq!(backend.page_count(&doc), 2);

    let page = block_on(backend.page(&doc, 2)).unwrap();
    let vp = backend.viewport(&page, 2.0);
    assert_eq!((vp.width, vp.height, vp.scale), (200.0, 100.0, 2.0));

    assert!(block_on(backend.page(&doc, 0)).is_err());
    assert!(block_on(backend.page(&doc, 3)).is_err());
}

#[test]
fn gated_render_completes_on_release() {
    let backend = MemoryBackend::new().with_document("a.pdf", vec![PageSize::LETTER]);
    let doc = block_on(backend.open(&"a.pdf".into())).unwrap();
    let page = block_on(backend.page(&doc, 1)).unwrap();
    let mut target = MemoryTarget::new();

    backend.set_gated(true);
    let task = backend
        .render(&page, &mut target, &backend.viewport(&page, 1.0))
        .unwrap();
    assert_eq!(backend.release_renders(), 1);
    assert!(block_on(task.completion()).is_ok());
    assert_eq!(backend.release_renders(), 0);
}

#[test]
fn cancelled_task_reports_cancelled() {
    let backend = MemoryBackend::new().with_document("a.pdf", vec![PageSize::LETTER]);
    backend.set_gated(true);
    let doc = block_on(backend.open(&"a.pdf".into())).unwrap();
    let page = block_on(backend.page(&doc, 1)).unwrap();
    let mut target = MemoryTarget::new();
    let task = backend
        .render(&page, &mut target, &backend.viewport(&page, 1.0))
        .unwrap();

    task.cancel();
    backend.release_renders();
    assert!(matches!(
        block_on(task.completion()),
        Err(RenderTaskError::Cancelled)
    ));
}
