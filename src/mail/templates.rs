use maud::{DOCTYPE, Markup, html};

use crate::auth::OTP_DURATION;

const CONTAINER_STYLE: &str = "font-family: Arial, sans-serif; max-width: 600px; \
    margin: 0 auto; padding: 20px; color: #1f2937;";
const OTP_STYLE: &str = "display: inline-block; font-size: 32px; font-weight: bold; \
    letter-spacing: 8px; padding: 12px 24px; background: #eff6ff; color: #1d4ed8; \
    border-radius: 8px;";
const BUTTON_STYLE: &str = "display: inline-block; padding: 12px 24px; \
    background: #2563eb; color: #ffffff; text-decoration: none; border-radius: 6px;";
const FOOTER_STYLE: &str = "font-size: 12px; color: #6b7280;";

fn email_base(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                div style=(CONTAINER_STYLE) {
                    (content)

                    p style=(FOOTER_STYLE) { "Finance Tracker" }
                }
            }
        }
    }
}

pub fn password_reset_email(otp: &str) -> Markup {
    let minutes = OTP_DURATION.whole_minutes();

    email_base(
        "Password Reset",
        html! {
            h2 { "Password Reset Request" }
            p { "Use the following one-time password to reset your password:" }
            p { span id="otp" style=(OTP_STYLE) { (otp) } }
            p { "This code expires in " (minutes) " minutes." }
            p { "If you did not request a password reset, you can ignore this email." }
        },
    )
}

pub fn welcome_email(name: &str, frontend_url: &str) -> Markup {
    let log_in_url = format!("{}/login", frontend_url.trim_end_matches('/'));

    email_base(
        "Welcome",
        html! {
            h2 { "Welcome to Finance Tracker, " (name) "!" }
            p {
                "Your account is ready. Start recording your incomes and expenses, \
                set a monthly budget, and track your savings goals."
            }
            p { a href=(log_in_url) style=(BUTTON_STYLE) { "Log in" } }
        },
    )
}
