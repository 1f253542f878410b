mod budget;
mod fx_rate;
mod timeframe;
mod transaction;

pub use budget::Budget;
pub use fx_rate::FxRate;
pub use timeframe::Timeframe;
pub use transaction::{Transaction, TransactionDraft, TxnType};
