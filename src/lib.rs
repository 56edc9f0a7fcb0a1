// qcm-forge: multiple-choice questions from French study notes
//
// This is the library root. `keywords` is the extraction and alignment
// engine; `qcm` turns notes into questions with a chat model; `db` stores
// the question bank and quiz progress.

pub mod config;
pub mod db;
pub mod keywords;
pub mod notes;
pub mod output;
pub mod qcm;
