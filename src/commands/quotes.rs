use crate::context::AppContext;
use crate::quote_cache::{FetchOutcome, QuoteView};

pub fn quotes_view(ctx: &AppContext) -> QuoteView {
    ctx.quotes.view()
}

/// Refresh now. A failed fetch is reported; the view keeps the last quotes.
pub async fn quotes_refresh(ctx: &AppContext) -> Result<QuoteView, String> {
    match ctx.refresh_quotes().await {
        FetchOutcome::Failed { message } => Err(message),
        _ => Ok(ctx.quotes.view()),
    }
}
