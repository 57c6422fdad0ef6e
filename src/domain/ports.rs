use crate::domain::model::Session;
use crate::utils::error::Result;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

/// Session defaults the host can source from the CLI, a TOML file, or both.
pub trait ConfigProvider {
    fn election_name(&self) -> &str;
    fn party_slots(&self) -> usize;
    fn divisor_ceiling(&self) -> u32;
    fn seats(&self) -> u32;

    fn initial_session(&self) -> Session {
        let mut session = Session::new(self.party_slots(), self.divisor_ceiling());
        session.election_name = self.election_name().to_string();
        session.seats = self.seats();
        session
    }
}
