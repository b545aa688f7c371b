use apotheca_app::context::AppContext;

pub(crate) async fn run(ctx: &AppContext) -> Result<(), String> {
    let profile = ctx
        .profile
        .current()
        .await
        .map_err(|error| format!("profile lookup failed: {error}"))?
        .ok_or_else(|| "profile not found".to_string())?;

    let field = |value: Option<&str>| value.unwrap_or("—").to_string();

    println!("name:     {}", field(profile.name.as_deref()));
    println!("firm:     {}", field(profile.firm.as_deref()));
    println!("kind:     {}", field(profile.kind.as_deref()));
    println!("address:  {}", field(profile.address.as_deref()));
    println!("phone:    {}", field(profile.phone.as_deref()));
    println!("manager:  {}", field(profile.manager.as_deref()));

    Ok(())
}
