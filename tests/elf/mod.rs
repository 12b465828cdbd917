mod crosscheck;
mod header;
