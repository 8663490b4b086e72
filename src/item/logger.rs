use std::fmt::Debug;

use log::info;

use crate::{
    BatchError,
    core::{item::RecordWriter, record::Batch},
};

/// Writes every record to the log at `info` level. Handy while developing a pipeline.
#[derive(Default)]
pub struct LoggerWriter {}

impl<P> RecordWriter<P> for LoggerWriter
where
    P: Debug,
{
    fn write_batch(&mut self, batch: &Batch<P>) -> Result<(), BatchError> {
        batch
            .iter()
            .for_each(|record| info!("Record:{:?}", record.payload()));
        Ok(())
    }
}
