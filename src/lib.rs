#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 <div align="center">
   <h1>Easy Batch for Rust</h1>
   <h3>A record-oriented batch processing engine</h3>

   ![license](https://shields.io/badge/license-MIT%2FApache--2.0-blue)

  </div>

 # Easy Batch for Rust

 **Easy Batch for Rust** takes care of the boilerplate of batch applications: reading records
 from a data source, filtering, mapping, validating and processing them, then writing them in
 batches to a data sink. You provide the collaborators, the engine runs the pipeline, handles
 errors according to your policy and hands you a report.

 ## Core Concepts

Understanding these core components will help you get started:

- **Record:** A payload paired with a header (record number, data source name, creation date).
- **Job:** One execution of a pipeline. Calling a job always yields a `JobReport`.
- **RecordReader:** Pulls records, one at a time, from a data source.
- **RecordFilter:** Keeps, rejects or flags as poison the records read.
- **RecordMapper:** Converts a record's payload into the pipeline's output type.
- **RecordValidator:** Rejects the records that violate a business rule.
- **RecordProcessor:** Business logic applied to every valid record. May veto a record or compute a result.
- **RecordWriter:** Writes records to a data sink, one batch at a time.
- **JobExecutor:** Runs several jobs concurrently on a pool of workers.

Every record read ends up in exactly one bucket of the job metrics: filtered, mapping error,
validation error, processing error or written. Record level errors are skipped, unless the
job runs in strict mode. Reader, writer and fatal processing errors fail the job.

 ## Features

| **Feature**   | **Description**                                               |
|---------------|---------------------------------------------------------------|
| logger        | Enables a logger `RecordWriter`, useful for debugging purposes |
| full          | Enables all available features                                |

 ## Getting Started

```toml
[dependencies]
easy-batch-rs = { version = "<version>" }
```

Then, on your main.rs:

```rust
# use easy_batch_rs::{
#     core::{
#         job::{Job, JobBuilder},
#         record::Record,
#         report::JobStatus,
#     },
#     error::BatchError,
#     item::{filter::RecordNumberBetweenFilter, iterator::IteratorRecordReader, vec::VecRecordWriter},
# };
#[derive(Debug, Clone, PartialEq)]
struct Car {
    year: u16,
    make: String,
    model: String,
}

fn parse(record: &Record<String>) -> Result<Record<Car>, BatchError> {
    let fields: Vec<&str> = record.payload().split(',').map(str::trim).collect();
    match fields.as_slice() {
        [year, make, model] => {
            let year = year
                .parse()
                .map_err(|_| BatchError::RecordMapper(format!("invalid year '{}'", year)))?;
            Ok(record.with_payload(Car {
                year,
                make: make.to_string(),
                model: model.to_string(),
            }))
        }
        _ => Err(BatchError::RecordMapper(format!(
            "expected 3 fields, got {}",
            fields.len()
        ))),
    }
}

fn main() -> Result<(), BatchError> {
    let csv = "year,make,model
   1948,Porsche,356
   1995,Peugeot,205
   20x1,Mazda,CX-30
   1967,Ford,Mustang";

    let writer = VecRecordWriter::new();

    let mut job = JobBuilder::with_mapper(parse)
        .name("cars")
        .reader(IteratorRecordReader::new("cars.csv", csv.lines().map(String::from)))
        .filter(RecordNumberBetweenFilter::new(1..=1)) // skip the header line
        .validator(|record: &Record<Car>| {
            if record.payload().year < 1950 {
                Err(BatchError::Validation(vec!["vintage cars are not supported".to_string()]))
            } else {
                Ok(())
            }
        })
        .processor(|record: Record<Car>| {
            Ok::<_, BatchError>(Some(record.map_payload(|car| Car {
                make: car.make.to_uppercase(),
                ..car
            })))
        })
        .writer(writer.clone())
        .batch_size(2)
        .build()?;

    let report = job.call();

    assert_eq!(report.status(), JobStatus::Completed);
    assert_eq!(report.metrics().read_count(), 5);
    assert_eq!(report.metrics().filtered_count(), 1);
    assert_eq!(report.metrics().mapping_error_count(), 1);
    assert_eq!(report.metrics().validation_error_count(), 1);
    assert_eq!(report.metrics().write_count(), 2);
    assert_eq!(writer.payloads()[0].make, "PEUGEOT");

    println!("{}", report);

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.

 ## Contribution
 Unless you explicitly state otherwise, any contribution intentionally submitted
 for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
 dual licensed as above, without any additional terms or conditions

 */

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of ready-made record readers, writers and filters
pub mod item;
