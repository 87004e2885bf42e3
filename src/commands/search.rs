use crate::context::AppContext;
use crate::search::SearchUpdate;
use crate::types::quote::SearchResult;

/// Handle a keystroke. `None` means a later keystroke took over and the
/// caller should leave the suggestion list alone.
pub async fn search_input(
    ctx: &AppContext,
    query: &str,
) -> Result<Option<Vec<SearchResult>>, String> {
    match ctx.search.input(query).await.map_err(|e| e.to_string())? {
        SearchUpdate::Cleared => Ok(Some(Vec::new())),
        SearchUpdate::Suggestions(results) => Ok(Some(results)),
        SearchUpdate::Superseded => Ok(None),
    }
}

/// Add the chosen suggestion to the watchlist and return the list.
pub fn search_select(ctx: &AppContext, symbol: &str) -> Result<Vec<String>, String> {
    ctx.search
        .select(symbol, &ctx.watchlist)
        .map_err(|e| e.to_string())?;
    Ok(ctx.watchlist.symbols())
}
