pub mod pvnode;
