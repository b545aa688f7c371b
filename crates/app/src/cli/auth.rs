use clap::{Args, Subcommand};

use apotheca_app::context::AppContext;

#[derive(Debug, Args)]
pub(crate) struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuthSubcommand {
    /// Sign in with phone number and password
    SignIn(CredentialsArgs),

    /// Clear the stored session
    Logout,

    /// Request a password-reset code for the given login
    ForgotPassword {
        /// Phone number used as the login
        #[arg(long)]
        login: String,
    },

    /// Set a new password after a reset and sign in
    SetPassword(CredentialsArgs),
}

#[derive(Debug, Args)]
struct CredentialsArgs {
    /// Phone number used as the login
    #[arg(long)]
    login: String,

    /// Password
    #[arg(long)]
    password: String,
}

pub(crate) async fn run(ctx: &AppContext, command: AuthCommand) -> Result<(), String> {
    match command.command {
        AuthSubcommand::SignIn(args) => {
            let user = ctx
                .session
                .sign_in(&args.login, &args.password)
                .await
                .map_err(|error| format!("sign-in failed: {error}"))?;

            println!(
                "signed in as {}",
                user.name.as_deref().unwrap_or("unknown user")
            );

            Ok(())
        }
        AuthSubcommand::Logout => {
            ctx.session.logout();

            println!("signed out");

            Ok(())
        }
        AuthSubcommand::ForgotPassword { login } => {
            ctx.session
                .request_password_reset(&login)
                .await
                .map_err(|error| format!("password reset request failed: {error}"))?;

            println!("a confirmation code has been sent to {login}");

            Ok(())
        }
        AuthSubcommand::SetPassword(args) => {
            let user = ctx
                .session
                .set_password(&args.login, &args.password)
                .await
                .map_err(|error| format!("setting the password failed: {error}"))?;

            println!(
                "password updated; signed in as {}",
                user.name.as_deref().unwrap_or("unknown user")
            );

            Ok(())
        }
    }
}
