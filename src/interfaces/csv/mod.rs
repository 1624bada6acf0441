pub mod account_reader;
pub mod report_writer;
pub mod transfer_reader;
