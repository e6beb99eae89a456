//! Tests for the tracer and the in-memory recording backend.

use ktrace::{RecordingBackend, TraceConfig, TraceError, Tracer, WriterBackend};

#[test]
fn records_are_sequenced() {
    let backend = RecordingBackend::new();
    let probe = backend.clone();
    let mut tracer = Tracer::new(TraceConfig::default(), backend);

    tracer.record(7, &[1, 2], false).unwrap();
    tracer.record(9, &[3], false).unwrap();

    let records = probe.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].seq, 1);
    assert_eq!(records[1].seq, 2);
    assert_eq!(records[0].record_type, 7);
    assert_eq!(records[1].payload, vec![3]);
}

#[test]
fn timestamp_only_when_requested() {
    let backend = RecordingBackend::new();
    let probe = backend.clone();
    let mut tracer = Tracer::new(TraceConfig::default(), backend);

    tracer.record(1, &[], false).unwrap();
    tracer.record(1, &[], true).unwrap();

    let records = probe.records();
    assert!(records[0].timestamp.is_none());
    assert!(records[1].timestamp.is_some());
}

#[test]
fn timestamp_suppressed_by_config() {
    let cfg = TraceConfig {
        include_timestamp: false,
        ..TraceConfig::default()
    };
    let backend = RecordingBackend::new();
    let probe = backend.clone();
    let mut tracer = Tracer::new(cfg, backend);

    tracer.record(1, &[], true).unwrap();
    assert!(probe.records()[0].timestamp.is_none());
}

#[test]
fn oversized_payload_rejected() {
    let cfg = TraceConfig {
        max_record_len: 4,
        ..TraceConfig::default()
    };
    let backend = RecordingBackend::new();
    let probe = backend.clone();
    let mut tracer = Tracer::new(cfg, backend);

    let err = tracer.record(1, &[0; 8], false).unwrap_err();
    assert!(matches!(err, TraceError::PayloadTooLarge(8)));
    assert!(probe.is_empty());
}

#[test]
fn hook_reaches_backend() {
    let backend = RecordingBackend::new();
    let probe = backend.clone();
    let handle = Tracer::new(TraceConfig::default(), backend).into_handle();

    let hook = handle.hook();
    hook(42, &[0xAB], true).unwrap();

    let record = probe.last_of(42).unwrap();
    assert_eq!(record.payload, vec![0xAB]);
    assert!(record.timestamp.is_some());
}

#[test]
fn handle_emit_variants() {
    let backend = RecordingBackend::new();
    let probe = backend.clone();
    let handle = Tracer::new(TraceConfig::default(), backend).into_handle();

    handle.emit(5, &[1]).unwrap();
    handle.emit_with_timestamp(6, &[2]).unwrap();

    let records = probe.records();
    assert!(records[0].timestamp.is_none());
    assert!(records[1].timestamp.is_some());
    assert_eq!(records[1].record_type, 6);
}

#[test]
fn records_of_filters_by_type() {
    let backend = RecordingBackend::new();
    let probe = backend.clone();
    let mut tracer = Tracer::new(TraceConfig::default(), backend);

    tracer.record(1, &[0], false).unwrap();
    tracer.record(2, &[1], false).unwrap();
    tracer.record(1, &[2], false).unwrap();

    let ones = probe.records_of(1);
    assert_eq!(ones.len(), 2);
    assert_eq!(ones[1].payload, vec![2]);
}

#[derive(Clone, Default)]
struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn writer_backend_formats_lines() {
    let buffer = SharedBuf::default();
    let probe = buffer.clone();
    let backend = WriterBackend::new(buffer);
    let mut tracer = Tracer::new(
        TraceConfig {
            include_timestamp: false,
            ..TraceConfig::default()
        },
        backend,
    );

    tracer.record(3, &[0x0A], false).unwrap();

    let text = String::from_utf8(probe.0.lock().unwrap().clone()).unwrap();
    assert!(text.starts_with("#001 rec=3"));
    assert!(text.ends_with('\n'));
}
