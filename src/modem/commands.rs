// ABOUTME: Typed wrappers for identification, radio state and call control
// ABOUTME: Thin parsers over session responses, no state of their own

use crate::error::{AtError, AtResult};
use crate::modem::Modem;

/// Parsed `+CSQ` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalQuality {
    /// 0-31 usable, 99 unknown
    pub rssi: u8,
    /// Bit error rate class, 0-7 usable, 99 unknown
    pub ber: u8,
}

impl SignalQuality {
    /// RSSI converted to dBm, when the modem reported a usable value.
    pub fn rssi_dbm(&self) -> Option<i16> {
        (self.rssi <= 31).then(|| -113 + 2 * i16::from(self.rssi))
    }
}

/// Parsed `+CREG` / `+CGREG` query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// URC reporting mode (`<n>`)
    pub mode: u8,
    /// Registration state (`<stat>`): 1 home, 5 roaming
    pub status: u8,
}

impl Registration {
    pub fn is_registered(&self) -> bool {
        self.status == 1 || self.status == 5
    }
}

impl Modem {
    /// Probe the link with a bare `AT`.
    pub async fn test(&self) -> AtResult<()> {
        self.expect_ok(&self.commands.test).await
    }

    /// Disable command echo (`ATE0`). Echoed lines are tolerated either
    /// way, but echo off halves the traffic.
    pub async fn echo_off(&self) -> AtResult<()> {
        self.expect_ok(&self.commands.echo_off).await
    }

    /// Enable command echo (`ATE1`).
    pub async fn echo_on(&self) -> AtResult<()> {
        self.expect_ok(&self.commands.echo_on).await
    }

    /// Soft-reset the module (`ATZ`).
    pub async fn reset(&self) -> AtResult<()> {
        self.expect_ok(&self.commands.reset).await
    }

    /// Restore factory settings (`AT&F`).
    pub async fn factory_reset(&self) -> AtResult<()> {
        self.expect_ok(&self.commands.factory_reset).await
    }

    /// Persist the current settings (`AT&W`).
    pub async fn save_settings(&self) -> AtResult<()> {
        self.expect_ok(&self.commands.save_settings).await
    }

    pub async fn manufacturer(&self) -> AtResult<String> {
        self.query_info(&self.commands.manufacturer).await
    }

    pub async fn model(&self) -> AtResult<String> {
        self.query_info(&self.commands.model).await
    }

    pub async fn revision(&self) -> AtResult<String> {
        self.query_info(&self.commands.revision).await
    }

    pub async fn serial_number(&self) -> AtResult<String> {
        self.query_info(&self.commands.serial_number).await
    }

    pub async fn imsi(&self) -> AtResult<String> {
        self.query_info(&self.commands.imsi).await
    }

    pub async fn iccid(&self) -> AtResult<String> {
        self.query_info(&self.commands.iccid).await
    }

    /// Query signal quality (`AT+CSQ`).
    pub async fn signal_quality(&self) -> AtResult<SignalQuality> {
        let (rssi, ber) = self
            .query_int_pair(&self.commands.signal_quality, "+CSQ:")
            .await?;
        Ok(SignalQuality { rssi, ber })
    }

    /// Query circuit-switched registration (`AT+CREG?`).
    pub async fn network_status(&self) -> AtResult<Registration> {
        let command = format!("{}?", self.commands.network_registration);
        let (mode, status) = self.query_int_pair(&command, "+CREG:").await?;
        Ok(Registration { mode, status })
    }

    /// Query packet-switched registration (`AT+CGREG?`).
    pub async fn gprs_status(&self) -> AtResult<Registration> {
        let command = format!("{}?", self.commands.gprs_registration);
        let (mode, status) = self.query_int_pair(&command, "+CGREG:").await?;
        Ok(Registration { mode, status })
    }

    /// Dial a number (`ATD<number>`).
    pub async fn dial(&self, number: &str) -> AtResult<()> {
        self.expect_ok(&format!("{}{}", self.commands.dial, number))
            .await
    }

    /// Answer an incoming call (`ATA`).
    pub async fn answer(&self) -> AtResult<()> {
        self.expect_ok(&self.commands.answer).await
    }

    /// Hang up the active call (`ATH`).
    pub async fn hangup(&self) -> AtResult<()> {
        self.expect_ok(&self.commands.hangup).await
    }

    pub(crate) async fn expect_ok(&self, command: &str) -> AtResult<()> {
        self.session.send_command_expect(command, "OK").await?;
        Ok(())
    }

    /// Issue an identification query and return the first payload line,
    /// skipping any echo of the command and the final response.
    async fn query_info(&self, command: &str) -> AtResult<String> {
        let responses = self.session.send_command(command).await?;
        responses
            .iter()
            .find(|line| line.as_str() != command && !self.session.responses().is_final(line))
            .map(|line| line.trim().to_owned())
            .ok_or_else(|| AtError::Parse(format!("no payload line in response to {command}")))
    }

    /// Issue a query and parse `<prefix> a,b` from its payload.
    async fn query_int_pair(&self, command: &str, prefix: &str) -> AtResult<(u8, u8)> {
        let responses = self.session.send_command(command).await?;
        let payload = responses
            .iter()
            .find_map(|line| line.strip_prefix(prefix))
            .ok_or_else(|| AtError::Parse(format!("no {prefix} line in response")))?;

        let mut fields = payload.split(',').map(str::trim);
        let parse = |field: Option<&str>| {
            field
                .and_then(|v| v.parse::<u8>().ok())
                .ok_or_else(|| AtError::Parse(format!("malformed {prefix} response: {payload}")))
        };
        Ok((parse(fields.next())?, parse(fields.next())?))
    }
}
