use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use nursery_config::EmailConfig;
use nursery_core::AppError;
use tracing::{info, instrument, warn};

use crate::metrics::track_email;

/// A rendered message, ready to be handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify-email?token={}", self.config.frontend_url, token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.config.frontend_url, token)
    }

    pub fn login_link(&self) -> String {
        format!("{}/login", self.config.frontend_url)
    }

    pub fn verification_email(&self, name: &str, token: &str, ttl_hours: i64) -> EmailContent {
        let link = self.verification_link(token);
        EmailContent {
            subject: "Verify your email address".to_string(),
            text: format!(
                "Hi {name},\n\n\
                 Thank you for registering with {org}.\n\n\
                 Please verify your email address by opening the link below:\n\
                 {link}\n\n\
                 This link will expire in {ttl_hours} hours.\n\n\
                 {org}",
                org = self.config.from_name,
            ),
            html: self.layout(
                "Verify your email address",
                &format!(
                    "<p>Hi <strong>{}</strong>,</p>\
                     <p>Thank you for registering. Please confirm your email address to activate your account.</p>\
                     {}\
                     <p><strong>This link will expire in {} hours.</strong></p>",
                    escape_html(name),
                    button(&link, "Verify Email"),
                    ttl_hours
                ),
            ),
        }
    }

    pub fn welcome_email(&self, name: &str) -> EmailContent {
        let link = self.login_link();
        EmailContent {
            subject: format!("Welcome to {}", self.config.from_name),
            text: format!(
                "Hi {name},\n\n\
                 Your email has been verified and your account is now active.\n\n\
                 Sign in here: {link}\n\n\
                 {org}",
                org = self.config.from_name,
            ),
            html: self.layout(
                "Welcome!",
                &format!(
                    "<p>Hi <strong>{}</strong>,</p>\
                     <p>Your email has been verified and your account is now active.</p>\
                     {}",
                    escape_html(name),
                    button(&link, "Sign In"),
                ),
            ),
        }
    }

    /// Sent when an admin creates a teacher or admin account.
    pub fn account_created_email(
        &self,
        name: &str,
        email: &str,
        temporary_password: &str,
        role: &str,
    ) -> EmailContent {
        let link = self.login_link();
        EmailContent {
            subject: format!("Your {} account has been created", self.config.from_name),
            text: format!(
                "Hi {name},\n\n\
                 A {role} account has been created for you.\n\n\
                 Email: {email}\n\
                 Temporary password: {temporary_password}\n\n\
                 You will be asked to change this password when you first sign in.\n\
                 Sign in here: {link}\n\n\
                 {org}",
                org = self.config.from_name,
            ),
            html: self.layout(
                "Your account is ready",
                &format!(
                    "<p>Hi <strong>{}</strong>,</p>\
                     <p>A {} account has been created for you.</p>\
                     <p>Email: <strong>{}</strong><br>Temporary password: <strong>{}</strong></p>\
                     <p>You will be asked to change this password when you first sign in.</p>\
                     {}",
                    escape_html(name),
                    escape_html(role),
                    escape_html(email),
                    escape_html(temporary_password),
                    button(&link, "Sign In"),
                ),
            ),
        }
    }

    pub fn password_reset_email(&self, name: &str, token: &str, ttl_hours: i64) -> EmailContent {
        let link = self.reset_link(token);
        let expiry = hours_phrase(ttl_hours);
        EmailContent {
            subject: "Password Reset Request".to_string(),
            text: format!(
                "Hi {name},\n\n\
                 You requested to reset your password.\n\n\
                 Open the link below to choose a new one:\n\
                 {link}\n\n\
                 This link will expire in {expiry}.\n\n\
                 If you didn't request this, please ignore this email.\n\n\
                 {org}",
                org = self.config.from_name,
            ),
            html: self.layout(
                "Password Reset Request",
                &format!(
                    "<p>Hi <strong>{}</strong>,</p>\
                     <p>We received a request to reset your password.</p>\
                     {}\
                     <p><strong>This link will expire in {}.</strong></p>\
                     <p>If you didn't request this, please ignore this email.</p>",
                    escape_html(name),
                    button(&link, "Reset Password"),
                    expiry
                ),
            ),
        }
    }

    pub fn password_reset_confirmation_email(&self, name: &str) -> EmailContent {
        EmailContent {
            subject: "Password Reset Successful".to_string(),
            text: format!(
                "Hi {name},\n\n\
                 Your password has been successfully reset.\n\n\
                 If you didn't make this change, please contact the nursery office immediately.\n\n\
                 {org}",
                org = self.config.from_name,
            ),
            html: self.layout(
                "Password Reset Successful",
                &format!(
                    "<p>Hi <strong>{}</strong>,</p>\
                     <p>Your password has been successfully reset.</p>\
                     <p>If you didn't make this change, please contact the nursery office immediately.</p>",
                    escape_html(name)
                ),
            ),
        }
    }

    /// Delivers `content`, or logs it when SMTP is disabled.
    #[instrument(skip(self, content), fields(subject = %content.subject))]
    pub async fn send(&self, kind: &'static str, to_email: &str, content: EmailContent) -> Result<(), AppError> {
        if !self.config.enabled {
            info!(to = %to_email, kind, "SMTP disabled, email not sent");
            return Ok(());
        }

        let result = self.deliver(to_email, content).await;
        track_email(kind, result.is_ok());
        result
    }

    /// Like [`send`](Self::send), but a failure is only logged.
    pub async fn send_or_log(&self, kind: &'static str, to_email: &str, content: EmailContent) {
        if let Err(err) = self.send(kind, to_email, content).await {
            warn!(to = %to_email, kind, error = %err.message(), "Failed to send email");
        }
    }

    async fn deliver(&self, to_email: &str, content: EmailContent) -> Result<(), AppError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?)
            .subject(content.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(content.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(content.html),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| {
                    AppError::internal_error(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {}", e)))?;

        Ok(())
    }

    fn layout(&self, heading: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{heading}</title>
</head>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif; background-color: #fdf8f0;">
    <div style="max-width: 600px; margin: 0 auto; background-color: #ffffff; border-radius: 8px; overflow: hidden;">
        <div style="background-color: #f59e0b; padding: 24px; text-align: center;">
            <h1 style="margin: 0; color: #ffffff; font-size: 26px;">{org}</h1>
        </div>
        <div style="padding: 32px 28px; color: #444444; font-size: 16px; line-height: 1.5;">
            <h2 style="margin: 0 0 16px 0; color: #333333;">{heading}</h2>
            {body}
        </div>
        <div style="background-color: #f8f9fa; padding: 16px; text-align: center; color: #999999; font-size: 12px;">
            This is an automated email from {org}. Please do not reply.
        </div>
    </div>
</body>
</html>"#,
            heading = escape_html(heading),
            org = escape_html(&self.config.from_name),
            body = body,
        )
    }
}

fn button(link: &str, label: &str) -> String {
    format!(
        r#"<p style="text-align: center; margin: 28px 0;"><a href="{link}" style="display: inline-block; padding: 12px 36px; background-color: #f59e0b; color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: bold;">{label}</a></p><p style="font-size: 13px; word-break: break-all;">{link}</p>"#,
        link = escape_html(link),
        label = label,
    )
}

fn hours_phrase(hours: i64) -> String {
    if hours == 1 {
        "1 hour".to_string()
    } else {
        format!("{} hours", hours)
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
