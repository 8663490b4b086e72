//! Blocking queues between jobs.
//!
//! A [`ChannelRecordWriter`] at the end of one job feeds the [`ChannelRecordReader`] of
//! another, which lets jobs be chained into fork/join pipelines running on a
//! [`JobExecutor`](crate::core::executor::JobExecutor). Records travel with their header, so a
//! poison record sent by a producer ends the consuming job.
//!
//! Both sides block the calling thread. They are meant to be used from jobs running on an
//! executor or on plain threads, never from inside an asynchronous task.

use log::debug;
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::{
    BatchError,
    core::{
        item::{RecordReader, RecordReaderResult, RecordWriter, RecordWriterResult},
        record::{Batch, Record},
    },
};

/// Creates a bounded queue of records and returns both ends.
///
/// # Examples
///
/// ```
/// use easy_batch_rs::core::{
///     item::RecordReader,
///     record::{Header, Record},
/// };
/// use easy_batch_rs::item::channel::record_channel;
///
/// let (sender, mut reader) = record_channel::<u32>("queue", 10);
///
/// sender.blocking_send(Record::new(Header::new(1, "producer"), 42)).unwrap();
/// sender.blocking_send(Record::new(Header::new(2, "producer"), 0).into_poison()).unwrap();
///
/// assert_eq!(*reader.read_record().unwrap().unwrap().payload(), 42);
/// assert!(reader.read_record().unwrap().unwrap().is_poison());
/// ```
pub fn record_channel<P>(
    source_name: impl Into<String>,
    capacity: usize,
) -> (Sender<Record<P>>, ChannelRecordReader<P>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (sender, ChannelRecordReader::new(source_name, receiver))
}

/// Reads records from a channel until every sender is dropped.
///
/// A poison record is handed to the job like any other record; the job ends on it.
pub struct ChannelRecordReader<P> {
    source_name: String,
    receiver: Receiver<Record<P>>,
}

impl<P> ChannelRecordReader<P> {
    pub fn new(source_name: impl Into<String>, receiver: Receiver<Record<P>>) -> Self {
        Self {
            source_name: source_name.into(),
            receiver,
        }
    }
}

impl<P> RecordReader<P> for ChannelRecordReader<P> {
    fn read_record(&mut self) -> RecordReaderResult<P> {
        Ok(self.receiver.blocking_recv())
    }

    fn close(&mut self) -> Result<(), BatchError> {
        debug!("Closing channel '{}'", self.source_name);
        self.receiver.close();
        Ok(())
    }

    fn source_name(&self) -> String {
        self.source_name.clone()
    }
}

/// Sends every written record to all of its channels.
///
/// Closing the writer drops its senders: readers on the other side see the end of the stream
/// once all their producers are closed.
pub struct ChannelRecordWriter<P> {
    senders: Vec<Sender<Record<P>>>,
}

impl<P> ChannelRecordWriter<P> {
    pub fn new(sender: Sender<Record<P>>) -> Self {
        Self {
            senders: vec![sender],
        }
    }

    /// Writes each record to every sender.
    pub fn broadcast(senders: Vec<Sender<Record<P>>>) -> Self {
        Self { senders }
    }
}

impl<P: Clone> RecordWriter<P> for ChannelRecordWriter<P> {
    fn write_batch(&mut self, batch: &Batch<P>) -> RecordWriterResult {
        for record in batch {
            for sender in &self.senders {
                send(sender, record.clone())?;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> RecordWriterResult {
        self.senders.clear();
        Ok(())
    }
}

/// Routes each record to the channel of the first predicate it matches.
///
/// Records matching no predicate go to the default channel if there is one and are dropped
/// otherwise.
///
/// # Examples
///
/// ```
/// use easy_batch_rs::core::{
///     executor::JobExecutor,
///     job::JobBuilder,
///     record::Record,
/// };
/// use easy_batch_rs::item::{
///     channel::{record_channel, ContentBasedChannelRecordWriter},
///     iterator::IteratorRecordReader,
///     vec::VecRecordWriter,
/// };
///
/// let (even_sender, even_reader) = record_channel("evens", 4);
/// let (odd_sender, odd_reader) = record_channel("odds", 4);
///
/// let fork = JobBuilder::new()
///     .name("fork")
///     .reader(IteratorRecordReader::new("numbers", 1..=10))
///     .writer(
///         ContentBasedChannelRecordWriter::new()
///             .route(|record: &Record<u32>| *record.payload() % 2 == 0, even_sender)
///             .default_route(odd_sender),
///     )
///     .build()
///     .unwrap();
///
/// let evens = VecRecordWriter::new();
/// let odds = VecRecordWriter::new();
/// let even_job = JobBuilder::new().name("evens").reader(even_reader).writer(evens.clone()).build().unwrap();
/// let odd_job = JobBuilder::new().name("odds").reader(odd_reader).writer(odds.clone()).build().unwrap();
///
/// let executor = JobExecutor::with_workers(3).unwrap();
/// let workers = executor.submit_all(vec![even_job, odd_job]).unwrap();
/// executor.execute(fork).unwrap();
/// for worker in workers {
///     worker.wait().unwrap();
/// }
/// executor.shutdown();
///
/// assert_eq!(evens.payloads(), vec![2, 4, 6, 8, 10]);
/// assert_eq!(odds.payloads(), vec![1, 3, 5, 7, 9]);
/// ```
pub struct ContentBasedChannelRecordWriter<P> {
    routes: Vec<Route<P>>,
    default: Option<Sender<Record<P>>>,
}

struct Route<P> {
    predicate: Box<dyn Fn(&Record<P>) -> bool + Send>,
    sender: Sender<Record<P>>,
}

impl<P> Default for ContentBasedChannelRecordWriter<P> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            default: None,
        }
    }
}

impl<P> ContentBasedChannelRecordWriter<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route<F>(mut self, predicate: F, sender: Sender<Record<P>>) -> Self
    where
        F: Fn(&Record<P>) -> bool + Send + 'static,
    {
        self.routes.push(Route {
            predicate: Box::new(predicate),
            sender,
        });
        self
    }

    pub fn default_route(mut self, sender: Sender<Record<P>>) -> Self {
        self.default = Some(sender);
        self
    }

    fn sender_for(&self, record: &Record<P>) -> Option<&Sender<Record<P>>> {
        self.routes
            .iter()
            .find(|route| (route.predicate)(record))
            .map(|route| &route.sender)
            .or(self.default.as_ref())
    }
}

impl<P: Clone> RecordWriter<P> for ContentBasedChannelRecordWriter<P> {
    fn write_batch(&mut self, batch: &Batch<P>) -> RecordWriterResult {
        for record in batch {
            match self.sender_for(record) {
                Some(sender) => send(sender, record.clone())?,
                None => debug!(
                    "No channel for record {}, dropping it",
                    record.header().number()
                ),
            }
        }
        Ok(())
    }

    fn close(&mut self) -> RecordWriterResult {
        self.routes.clear();
        self.default = None;
        Ok(())
    }
}

fn send<P>(sender: &Sender<Record<P>>, record: Record<P>) -> RecordWriterResult {
    sender.blocking_send(record).map_err(|error| {
        BatchError::RecordWriter(format!(
            "channel closed, record {} not delivered",
            error.0.header().number()
        ))
    })
}
