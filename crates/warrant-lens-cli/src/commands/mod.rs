pub mod market;
pub mod scenarios;
pub mod screener;
pub mod trading;
pub mod warrant;
