#![allow(dead_code)]

pub mod mocks;

use std::collections::VecDeque;

use easy_batch_rs::core::record::{Header, Record};

pub use mocks::{MockReader, MockWriter};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A reader that opens and closes successfully and yields the given payloads.
pub fn reader_of(payloads: &[&str]) -> MockReader {
    let mut records: VecDeque<Record<String>> = payloads
        .iter()
        .enumerate()
        .map(|(index, payload)| {
            Record::new(Header::new(index as u64 + 1, "mock"), payload.to_string())
        })
        .collect();

    let mut reader = MockReader::new();
    reader.expect_open().times(1).returning(|| Ok(()));
    reader
        .expect_read_record()
        .returning(move || Ok(records.pop_front()));
    reader.expect_close().times(1).returning(|| Ok(()));
    reader
        .expect_total_records()
        .return_const(Some(payloads.len() as u64));
    reader
        .expect_source_name()
        .return_const("mock".to_string());
    reader
}

/// A writer that opens, writes and closes successfully.
pub fn accepting_writer() -> MockWriter {
    let mut writer = MockWriter::new();
    writer.expect_open().times(1).returning(|| Ok(()));
    writer.expect_write_batch().returning(|_| Ok(()));
    writer.expect_close().times(1).returning(|| Ok(()));
    writer
}
