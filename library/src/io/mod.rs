pub mod exporters;
