//! Users command - list users through the search flow

use anyhow::Result;

use super::get_context;
use crate::output;

pub async fn run(filter: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let users = ctx.user_service.search(filter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Username", "First name", "Last name"]);
    for user in &users {
        table.add_row(vec![
            user.id.to_string(),
            user.username.clone(),
            user.first_name.clone(),
            user.last_name.clone(),
        ]);
    }
    println!("{}", table);
    println!("{} user(s)", users.len());

    Ok(())
}
