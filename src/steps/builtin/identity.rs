//! Rename the machine and join it to the Active Directory domain.
//!
//! Both happen in a single `Add-Computer -NewName` call so the new name is
//! the one registered in the directory. Interactive runs let PowerShell show
//! its own credential dialog, which is why that invocation is not captured.
//! Unattended runs build the credential from [`PASSWORD_ENV`] instead.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::shell::{CommandOptions, Invocation};
use crate::steps::{StepDefinition, StepOutcome};

use super::{StepContext, IDENTITY};

/// Environment variable holding the domain admin password for unattended runs.
pub const PASSWORD_ENV: &str = "PROVISIONER_DOMAIN_PASSWORD";

/// Seconds between scheduling the restart and the restart itself.
const REBOOT_DELAY_SECS: u32 = 5;

static HOSTNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9\-]{0,13}[A-Za-z0-9])?$").unwrap());

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$",
    )
    .unwrap()
});

static USER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9.\-_]+\\[A-Za-z0-9.\-_]+|[A-Za-z0-9.\-_]+@[A-Za-z0-9.\-]+|[A-Za-z0-9.\-_]+)$")
        .unwrap()
});

/// NetBIOS name: 1-15 letters, digits or hyphens, no hyphen at either end.
pub fn is_valid_hostname(name: &str) -> bool {
    HOSTNAME_RE.is_match(name)
}

/// Dotted FQDN such as `corp.local`.
pub fn is_valid_domain(domain: &str) -> bool {
    DOMAIN_RE.is_match(domain)
}

/// `user`, `DOMAIN\user` or `user@domain`.
pub fn is_valid_admin_user(user: &str) -> bool {
    USER_RE.is_match(user)
}

pub const HOSTNAME_HINT: &str = "use 1-15 letters, digits or hyphens, not starting or ending with a hyphen";
pub const DOMAIN_HINT: &str = "expected a dotted name such as corp.local";
pub const ADMIN_USER_HINT: &str = r"use user, DOMAIN\user or user@domain";

/// Fully resolved identity parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRequest {
    pub hostname: String,
    pub domain: String,
    pub admin_user: String,
    /// Restart once the join succeeded.
    pub reboot: bool,
    /// Take the password from [`PASSWORD_ENV`] instead of a dialog.
    pub unattended: bool,
}

impl IdentityRequest {
    /// Every problem with the inputs, one message each.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !is_valid_hostname(&self.hostname) {
            problems.push(format!("hostname '{}': {}", self.hostname, HOSTNAME_HINT));
        }
        if !is_valid_domain(&self.domain) {
            problems.push(format!("domain '{}': {}", self.domain, DOMAIN_HINT));
        }
        if !is_valid_admin_user(&self.admin_user) {
            problems.push(format!("admin user '{}': {}", self.admin_user, ADMIN_USER_HINT));
        }
        problems
    }
}

/// The PowerShell that performs rename plus join.
pub fn join_script(req: &IdentityRequest) -> String {
    let credential = if req.unattended {
        format!(
            "$secure = ConvertTo-SecureString $env:{} -AsPlainText -Force\n\
             $cred = New-Object System.Management.Automation.PSCredential('{}', $secure)",
            PASSWORD_ENV, req.admin_user
        )
    } else {
        format!(
            "$cred = Get-Credential -Message 'Credentials for {user}' -UserName '{user}'",
            user = req.admin_user
        )
    };

    format!(
        "{credential}\n\
         if ($null -eq $cred) {{ Write-Error 'No credentials supplied.'; exit 1 }}\n\
         try {{\n\
         Add-Computer -DomainName '{domain}' -NewName '{host}' -Credential $cred -Force -Restart:$false -ErrorAction Stop\n\
         }} catch {{\n\
         Write-Error \"Identity change failed: $_\"\n\
         exit 1\n\
         }}",
        credential = credential,
        domain = req.domain,
        host = req.hostname,
    )
}

pub fn reboot_invocation() -> Invocation {
    Invocation::program(
        "shutdown.exe",
        [
            "/r".to_string(),
            "/t".to_string(),
            REBOOT_DELAY_SECS.to_string(),
            "/c".to_string(),
            "Restart after domain join".to_string(),
        ],
    )
}

pub fn step(req: IdentityRequest, ctx: &StepContext) -> StepDefinition {
    let ctx = ctx.clone();
    let detail = format!("{} -> {} as {}", req.hostname, req.domain, req.admin_user);

    StepDefinition::new(IDENTITY, "Rename and join domain", move || {
        let password = std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty());
        Ok(join(&req, &ctx, password.is_some()))
    })
    .with_detail(detail)
}

/// Run the join. `password_available` only matters for unattended requests.
pub fn join(req: &IdentityRequest, ctx: &StepContext, password_available: bool) -> StepOutcome {
    let problems = req.problems();
    if !problems.is_empty() {
        return StepOutcome::failed(problems.join("; "));
    }
    if req.unattended && !password_available {
        return StepOutcome::failed(format!(
            "{} is not set; unattended domain join cannot ask for a password",
            PASSWORD_ENV
        ));
    }

    info!(
        "Renaming to {} and joining {} as {}",
        req.hostname, req.domain, req.admin_user
    );
    let options = if req.unattended {
        CommandOptions::captured()
    } else {
        CommandOptions::interactive()
    };

    let result = match ctx
        .runner
        .run(&Invocation::powershell(join_script(req)), &options)
    {
        Ok(result) => result,
        Err(e) => return StepOutcome::failed(e.to_string()),
    };
    if !result.success() {
        let output = result.combined_output();
        warn!("Domain join failed with exit code {}: {}", result.exit_code, output);
        return if output.is_empty() {
            StepOutcome::failed(format!("domain join failed (exit code {})", result.exit_code))
        } else {
            StepOutcome::failed(format!("domain join failed: {}", output))
        };
    }
    info!("Joined {} as {}", req.domain, req.hostname);

    if !req.reboot {
        return StepOutcome::warning("restart required to apply the new name");
    }
    match ctx.runner.run(&reboot_invocation(), &CommandOptions::captured()) {
        Ok(r) if r.success() => {
            info!("Restart scheduled in {}s", REBOOT_DELAY_SECS);
            StepOutcome::Success
        }
        Ok(r) => StepOutcome::warning(format!(
            "joined, but the restart could not be scheduled (exit code {})",
            r.exit_code
        )),
        Err(e) => StepOutcome::warning(format!("joined, but the restart failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use std::rc::Rc;

    fn request() -> IdentityRequest {
        IdentityRequest {
            hostname: "WS-042".into(),
            domain: "corp.local".into(),
            admin_user: r"CORP\admin".into(),
            reboot: false,
            unattended: false,
        }
    }

    #[test]
    fn hostname_rules() {
        assert!(is_valid_hostname("WS-042"));
        assert!(is_valid_hostname("A"));
        assert!(is_valid_hostname("ABCDEFGHIJKLMNO"));
        assert!(!is_valid_hostname("ABCDEFGHIJKLMNOP"));
        assert!(!is_valid_hostname("-WS"));
        assert!(!is_valid_hostname("WS-"));
        assert!(!is_valid_hostname("WS_01"));
        assert!(!is_valid_hostname(""));
    }

    #[test]
    fn domain_rules() {
        assert!(is_valid_domain("corp.local"));
        assert!(is_valid_domain("a.b.example.com"));
        assert!(!is_valid_domain("corp"));
        assert!(!is_valid_domain("-corp.local"));
        assert!(!is_valid_domain("corp..local"));
    }

    #[test]
    fn admin_user_forms() {
        assert!(is_valid_admin_user("admin"));
        assert!(is_valid_admin_user(r"CORP\admin"));
        assert!(is_valid_admin_user("admin@corp.local"));
        assert!(!is_valid_admin_user("bad user"));
        assert!(!is_valid_admin_user(r"CORP\"));
    }

    #[test]
    fn interactive_join_uses_credential_dialog_uncaptured() {
        let runner = Rc::new(ScriptedRunner::default());
        let ctx = context(runner.clone(), SetProbe::default());

        let outcome = join(&request(), &ctx, false);

        assert!(outcome.is_warning());
        let calls = runner.calls.borrow();
        assert!(!calls[0].1.capture);
        let Invocation::PowerShell(script) = &calls[0].0 else {
            panic!("expected powershell");
        };
        assert!(script.contains("Get-Credential"));
        assert!(script.contains("-NewName 'WS-042'"));
        assert!(script.contains("-DomainName 'corp.local'"));
    }

    #[test]
    fn unattended_without_password_fails_fast() {
        let runner = Rc::new(ScriptedRunner::default());
        let ctx = context(runner.clone(), SetProbe::default());
        let req = IdentityRequest {
            unattended: true,
            ..request()
        };

        let outcome = join(&req, &ctx, false);

        assert!(outcome.reason().unwrap().contains(PASSWORD_ENV));
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn unattended_script_reads_password_from_environment() {
        let req = IdentityRequest {
            unattended: true,
            ..request()
        };
        let script = join_script(&req);

        assert!(script.contains(&format!("$env:{}", PASSWORD_ENV)));
        assert!(!script.contains("Get-Credential"));
    }

    #[test]
    fn failed_join_does_not_reboot() {
        let runner = Rc::new(ScriptedRunner::default());
        runner.push_exit(1);
        let ctx = context(runner.clone(), SetProbe::default());
        let req = IdentityRequest {
            reboot: true,
            ..request()
        };

        let outcome = join(&req, &ctx, false);

        assert!(outcome.is_failure());
        assert_eq!(runner.call_count(), 1);
    }

    #[test]
    fn successful_join_schedules_reboot() {
        let runner = Rc::new(ScriptedRunner::default());
        let ctx = context(runner.clone(), SetProbe::default());
        let req = IdentityRequest {
            reboot: true,
            ..request()
        };

        let outcome = join(&req, &ctx, false);

        assert_eq!(outcome, StepOutcome::Success);
        assert_eq!(runner.invocation(1), reboot_invocation());
    }

    #[test]
    fn invalid_inputs_never_reach_powershell() {
        let runner = Rc::new(ScriptedRunner::default());
        let ctx = context(runner.clone(), SetProbe::default());
        let req = IdentityRequest {
            hostname: "THIS-NAME-IS-WAY-TOO-LONG".into(),
            ..request()
        };

        assert!(join(&req, &ctx, true).is_failure());
        assert_eq!(runner.call_count(), 0);
    }
}
