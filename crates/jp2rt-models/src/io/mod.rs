pub mod tsv;

pub use tsv::{
    format_value, load_dataset, load_descriptors, load_retention_times, write_predictions,
    Dataset,
};
