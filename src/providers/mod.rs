pub mod ultradns;
