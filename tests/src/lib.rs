#![cfg(test)]

mod scan;
mod support;
