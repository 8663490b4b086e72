mod common;

use std::sync::{Arc, Mutex};

use anyhow::Result;
use common::{accepting_writer, init_logger, reader_of};
use serde_json::{Value, json};

use easy_batch_rs::{
    BatchError,
    core::{
        item::{FilterDecision, RecordProcessor, RecordProcessorResult},
        job::{Job, JobBuilder},
        listener::{ListenerResult, PipelineListener, RecordReaderListener},
        parameters::JobParameters,
        record::Record,
        report::JobStatus,
    },
    item::{
        filter::{EmptyRecordFilter, PoisonRecordFilter},
        iterator::IteratorRecordReader,
        vec::VecRecordWriter,
    },
};

#[derive(Debug, Clone, PartialEq)]
struct Tweet {
    id: u32,
    user: String,
    message: String,
}

fn parse_tweet(record: &Record<String>) -> Result<Record<Tweet>, BatchError> {
    let mut fields = record.payload().splitn(3, ',');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(id), Some(user), Some(message)) => {
            let id = id
                .trim()
                .parse()
                .map_err(|_| BatchError::RecordMapper(format!("invalid id '{}'", id)))?;
            Ok(record.with_payload(Tweet {
                id,
                user: user.trim().to_string(),
                message: message.trim().to_string(),
            }))
        }
        _ => Err(BatchError::RecordMapper(format!(
            "malformed line '{}'",
            record.payload()
        ))),
    }
}

/// Counts words of all processed tweets and exposes the total as its result.
#[derive(Default)]
struct WordCounter {
    words: usize,
}

impl RecordProcessor<Tweet> for WordCounter {
    fn process(&mut self, record: Record<Tweet>) -> RecordProcessorResult<Tweet> {
        self.words += record.payload().message.split_whitespace().count();
        Ok(Some(record))
    }

    fn result(&self) -> Option<Value> {
        Some(json!({ "words": self.words }))
    }
}

#[derive(Clone, Default)]
struct Audit(Arc<Mutex<Vec<(u64, Option<u32>)>>>);

impl PipelineListener<String, Tweet> for Audit {
    fn after_record_processing(
        &mut self,
        input: &Record<String>,
        output: Option<&Record<Tweet>>,
    ) -> ListenerResult {
        self.0
            .lock()
            .unwrap()
            .push((input.header().number(), output.map(|record| record.payload().id)));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct ReadCounter(Arc<Mutex<(u32, u32)>>);

impl RecordReaderListener<String> for ReadCounter {
    fn after_reader_open(&mut self) -> ListenerResult {
        self.0.lock().unwrap().0 += 1;
        Ok(())
    }

    fn after_record_reading(&mut self, record: Option<&Record<String>>) -> ListenerResult {
        if record.is_some() {
            self.0.lock().unwrap().1 += 1;
        }
        Ok(())
    }
}

#[test]
fn tweets_go_through_every_stage() -> Result<()> {
    init_logger();

    let lines = vec![
        "id,user,message",
        "1,foo,hello world",
        "",
        "2,bar,easy batch rocks",
        "x,baz,not a number",
        "3,spam,buy now",
        "4,foo,bye",
    ];

    let writer = VecRecordWriter::new();
    let audit = Audit::default();
    let reads = ReadCounter::default();

    let mut job = JobBuilder::with_mapper(parse_tweet)
        .name("tweets")
        .reader(IteratorRecordReader::new(
            "tweets.csv",
            lines.into_iter().map(String::from),
        ))
        .filter(|record: &Record<String>| FilterDecision::from(record.header().number() > 1))
        .filter(EmptyRecordFilter)
        .validator(|record: &Record<Tweet>| {
            if record.payload().user == "spam" {
                Err(BatchError::Validation(vec!["spammer".to_string()]))
            } else {
                Ok(())
            }
        })
        .processor(|record: Record<Tweet>| {
            Ok::<_, BatchError>(Some(record.map_payload(|tweet| Tweet {
                message: tweet.message.to_uppercase(),
                ..tweet
            })))
        })
        .processor(WordCounter::default())
        .processor(|record: Record<Tweet>| {
            if record.payload().message == "BYE" {
                Ok::<_, BatchError>(None)
            } else {
                Ok(Some(record))
            }
        })
        .pipeline_listener(audit.clone())
        .reader_listener(reads.clone())
        .writer(writer.clone())
        .batch_size(10)
        .build()?;

    let report = job.call();

    assert_eq!(report.status(), JobStatus::Completed);
    let metrics = report.metrics();
    assert_eq!(metrics.read_count(), 7);
    // header, empty line and the vetoed "BYE"
    assert_eq!(metrics.filtered_count(), 3);
    assert_eq!(metrics.mapping_error_count(), 1);
    assert_eq!(metrics.validation_error_count(), 1);
    assert_eq!(metrics.write_count(), 2);
    assert_eq!(metrics.accounted_count(), metrics.read_count());

    assert_eq!(report.results(), &[json!({ "words": 6 })]);
    let messages: Vec<String> = writer
        .payloads()
        .into_iter()
        .map(|tweet| tweet.message)
        .collect();
    assert_eq!(messages, vec!["HELLO WORLD", "EASY BATCH ROCKS"]);

    let audited = audit.0.lock().unwrap().clone();
    assert_eq!(
        audited,
        vec![(1, None), (2, Some(1)), (3, None), (4, Some(2)), (7, None)]
    );
    assert_eq!(*reads.0.lock().unwrap(), (1, 7));

    Ok(())
}

#[test]
fn poison_filter_ends_the_job_early() {
    init_logger();

    let writer = VecRecordWriter::new();
    let mut job = JobBuilder::new()
        .reader(IteratorRecordReader::new(
            "stream",
            ["a", "b", "EOF", "c"].map(String::from),
        ))
        .filter(PoisonRecordFilter::new(|record: &Record<String>| {
            record.payload() == "EOF"
        }))
        .writer(writer.clone())
        .build()
        .unwrap();

    let report = job.call();

    assert_eq!(report.status(), JobStatus::Completed);
    assert_eq!(report.metrics().read_count(), 2);
    assert_eq!(writer.payloads(), vec!["a", "b"]);
}

#[test]
fn custom_metrics_end_up_in_the_report() -> Result<()> {
    init_logger();

    let parameters = JobParameters::from_json(
        r#"{"name": "measured", "batch_size": 2, "silent_mode": true}"#,
    )?;

    let builder = JobBuilder::new();
    let metrics = builder.custom_metrics();
    let mut job = builder
        .parameters(parameters)
        .reader(reader_of(&["abc", "de", "f"]))
        .processor(move |record: Record<String>| {
            metrics.increment("characters", record.payload().len() as f64);
            Ok::<_, BatchError>(Some(record))
        })
        .writer(accepting_writer())
        .build()?;
    job.custom_metrics().set("partitions", 1.0);

    let report = job.call();

    assert_eq!(report.job_name(), "measured");
    assert_eq!(report.parameters().batch_size, 2);
    assert_eq!(report.metrics().custom_metric("characters"), Some(6.0));
    assert_eq!(report.metrics().custom_metric("partitions"), Some(1.0));
    assert!(report.to_string().contains("characters = 6"));

    let json: Value = serde_json::from_str(&report.to_json()?)?;
    assert_eq!(json["status"], "COMPLETED");
    assert_eq!(json["metrics"]["write_count"], 3);

    Ok(())
}

#[test]
fn tweets_are_marshalled_to_json_before_writing() -> Result<()> {
    init_logger();

    let writer = VecRecordWriter::new();
    let mut job = JobBuilder::with_mapper(parse_tweet)
        .name("tweets-to-json")
        .reader(IteratorRecordReader::new(
            "tweets.csv",
            vec!["1,foo,hello world", "2,bar,nope", "3,baz,easy batch"]
                .into_iter()
                .map(String::from),
        ))
        .processor(WordCounter::default())
        .marshaller(|record: Record<Tweet>| {
            let tweet = record.payload();
            let value = json!({ "id": tweet.id, "user": tweet.user, "message": tweet.message });
            Ok::<_, BatchError>(Some(record.with_payload(value)))
        })
        .processor(|record: Record<Value>| {
            if record.payload()["message"] == "nope" {
                return Ok(None);
            }
            Ok::<_, BatchError>(Some(record))
        })
        .writer(writer.clone())
        .build()?;

    let report = job.call();

    assert_eq!(report.status(), JobStatus::Completed);
    assert_eq!(report.metrics().read_count(), 3);
    assert_eq!(report.metrics().filtered_count(), 1);
    assert_eq!(report.results(), &[json!({ "words": 5 })]);
    assert_eq!(
        writer.payloads(),
        vec![
            json!({ "id": 1, "user": "foo", "message": "hello world" }),
            json!({ "id": 3, "user": "baz", "message": "easy batch" }),
        ]
    );

    Ok(())
}
