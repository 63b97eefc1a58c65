pub mod fetching;
