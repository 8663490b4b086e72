//! Mock record readers and writers.
use mockall::mock;

use easy_batch_rs::{
    BatchError,
    core::{
        item::{RecordReader, RecordReaderResult, RecordWriter, RecordWriterResult},
        record::Batch,
    },
};

mock! {
    pub Reader {}
    impl RecordReader<String> for Reader {
        fn open(&mut self) -> Result<(), BatchError>;
        fn read_record(&mut self) -> RecordReaderResult<String>;
        fn close(&mut self) -> Result<(), BatchError>;
        fn total_records(&self) -> Option<u64>;
        fn source_name(&self) -> String;
    }
}

mock! {
    pub Writer {}
    impl RecordWriter<String> for Writer {
        fn open(&mut self) -> RecordWriterResult;
        fn write_batch(&mut self, batch: &Batch<String>) -> RecordWriterResult;
        fn close(&mut self) -> RecordWriterResult;
    }
}
