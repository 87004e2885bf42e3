use crate::context::AppContext;

pub fn watchlist_get(ctx: &AppContext) -> Vec<String> {
    ctx.watchlist.symbols()
}

/// Add a symbol and return the resulting list.
pub fn watchlist_add(ctx: &AppContext, symbol: &str) -> Result<Vec<String>, String> {
    ctx.watchlist.add_symbol(symbol).map_err(|e| e.to_string())?;
    Ok(ctx.watchlist.symbols())
}

pub fn watchlist_remove(ctx: &AppContext, symbol: &str) -> Result<Vec<String>, String> {
    ctx.watchlist
        .remove_symbol(symbol)
        .map_err(|e| e.to_string())?;
    Ok(ctx.watchlist.symbols())
}
