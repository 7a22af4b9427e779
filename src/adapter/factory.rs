//! Maps a type identifier and a parameter bag to a ready-to-run command

use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::Arc
};

use tracing::{Level, event};

use crate::{
    adapter::{
        base::BaseCommand,
        fixture::{
            delete::{self, DeleteTestData},
            generate::{self, GenerateTestData},
            validate::{self, ValidateTestData}
        }
    },
    domain::{constant::factory, error::CommandError, value::Parameters},
    port::{command::SharedCommand, fixture::FixtureStore}
};

/// Command types the factory can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    GenerateTestData,
    DeleteTestData,
    /// Delete preset with `deleteAll` and `confirmDelete` already set
    ClearTestData,
    ValidateTestData
}

impl CommandKind {
    pub const ALL: [CommandKind; 4] =
        [CommandKind::GenerateTestData, CommandKind::DeleteTestData, CommandKind::ClearTestData, CommandKind::ValidateTestData];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::GenerateTestData => "GENERATE_TEST_DATA",
            CommandKind::DeleteTestData => "DELETE_TEST_DATA",
            CommandKind::ClearTestData => "CLEAR_TEST_DATA",
            CommandKind::ValidateTestData => "VALIDATE_TEST_DATA"
        }
    }
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = CommandError;

    /// Case-insensitive; a blank identifier is a caller error, an unknown one is unsupported
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let identifier = s.trim();
        if identifier.is_empty() {
            return Err(CommandError::Precondition("command type must not be blank".to_string()));
        }

        let upper = identifier.to_ascii_uppercase();
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == upper)
            .ok_or_else(|| CommandError::UnsupportedCommandType(identifier.to_string()))
    }
}

pub struct CommandFactory {
    store: Arc<dyn FixtureStore>
}

impl CommandFactory {
    pub fn new(store: Arc<dyn FixtureStore>) -> Self {
        Self { store }
    }

    /// Build a command from its type identifier; `None` parameters leave the command's defaults
    pub fn create_command(
        &self,
        command_type: &str,
        parameters: Option<Parameters>
    ) -> Result<SharedCommand, CommandError> {
        let kind = command_type.parse::<CommandKind>().inspect_err(|error| {
            event!(Level::WARN, event = factory::UNSUPPORTED_TYPE, command_type = command_type, error = %error);
        })?;
        Ok(self.create(kind, parameters))
    }

    pub fn create(&self, kind: CommandKind, parameters: Option<Parameters>) -> SharedCommand {
        let parameters = parameters.unwrap_or_default();

        let command = match kind {
            CommandKind::GenerateTestData => BaseCommand::new(
                generate::NAME,
                generate::DESCRIPTION,
                generate::COMMAND_TYPE,
                GenerateTestData::new(self.store.clone())
            )
            .with_parameters(parameters)
            .into_shared(),
            CommandKind::DeleteTestData => self.delete_command(parameters),
            CommandKind::ClearTestData => {
                let mut preset =
                    Parameters::new().with(delete::param::DELETE_ALL, true).with(delete::param::CONFIRM_DELETE, true);
                preset.extend(parameters);
                self.delete_command(preset)
            }
            CommandKind::ValidateTestData => BaseCommand::new(
                validate::NAME,
                validate::DESCRIPTION,
                validate::COMMAND_TYPE,
                ValidateTestData::new(self.store.clone())
            )
            .with_parameters(parameters)
            .into_shared()
        };

        event!(Level::DEBUG, event = factory::COMMAND_CREATED, kind = %kind, command = %command.name());
        command
    }

    fn delete_command(&self, parameters: Parameters) -> SharedCommand {
        BaseCommand::new(delete::NAME, delete::DESCRIPTION, delete::COMMAND_TYPE, DeleteTestData::new(self.store.clone()))
            .with_parameters(parameters)
            .into_shared()
    }

    /// Generator with every default (300 records over 10 invoices)
    pub fn generate_default_test_data(&self) -> SharedCommand {
        self.create(CommandKind::GenerateTestData, None)
    }

    pub fn generate_test_data(&self, count: usize) -> SharedCommand {
        self.create(CommandKind::GenerateTestData, Some(Parameters::new().with(generate::param::COUNT, count)))
    }

    pub fn generate_test_data_with_layout(&self, invoice_count: usize, credits_per_invoice: usize) -> SharedCommand {
        let parameters = Parameters::new()
            .with(generate::param::INVOICE_COUNT, invoice_count)
            .with(generate::param::CREDITS_PER_INVOICE, credits_per_invoice);
        self.create(CommandKind::GenerateTestData, Some(parameters))
    }

    pub fn delete_all_test_data(&self) -> SharedCommand {
        let parameters =
            Parameters::new().with(delete::param::DELETE_ALL, true).with(delete::param::CONFIRM_DELETE, true);
        self.create(CommandKind::DeleteTestData, Some(parameters))
    }

    pub fn delete_specific_test_data(&self, number_prefix: &str, invoice_prefix: &str) -> SharedCommand {
        let parameters = Parameters::new()
            .with(delete::param::DELETE_ALL, false)
            .with(delete::param::NUMBER_PREFIX, number_prefix)
            .with(delete::param::INVOICE_PREFIX, invoice_prefix)
            .with(delete::param::CONFIRM_DELETE, true);
        self.create(CommandKind::DeleteTestData, Some(parameters))
    }

    pub fn delete_test_data_by_type(&self, credit_type: &str) -> SharedCommand {
        let parameters = Parameters::new()
            .with(delete::param::DELETE_ALL, false)
            .with(delete::param::CREDIT_TYPE, credit_type)
            .with(delete::param::CONFIRM_DELETE, true);
        self.create(CommandKind::DeleteTestData, Some(parameters))
    }

    pub fn clear_test_data(&self) -> SharedCommand {
        self.create(CommandKind::ClearTestData, None)
    }

    pub fn validate_test_data(&self) -> SharedCommand {
        self.create(CommandKind::ValidateTestData, None)
    }

    pub fn supported_command_types(&self) -> Vec<&'static str> {
        CommandKind::ALL.iter().map(CommandKind::as_str).collect()
    }

    pub fn is_command_type_supported(&self, command_type: &str) -> bool {
        command_type.parse::<CommandKind>().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapter::fixture::store::InMemoryFixtureStore, domain::value::Value};

    fn factory() -> (Arc<InMemoryFixtureStore>, CommandFactory) {
        let store = Arc::new(InMemoryFixtureStore::new());
        (store.clone(), CommandFactory::new(store))
    }

    #[test]
    fn test_kind_parsing_is_case_insensitive() {
        assert_eq!("generate_test_data".parse::<CommandKind>().unwrap(), CommandKind::GenerateTestData);
        assert_eq!(" Clear_Test_Data ".parse::<CommandKind>().unwrap(), CommandKind::ClearTestData);
        assert!(matches!("".parse::<CommandKind>(), Err(CommandError::Precondition(_))));
        assert!(matches!("REBOOT".parse::<CommandKind>(), Err(CommandError::UnsupportedCommandType(_))));
    }

    #[test]
    fn test_create_command_applies_parameters() {
        let (_, factory) = factory();

        let command = factory
            .create_command("GENERATE_TEST_DATA", Some(Parameters::new().with(generate::param::COUNT, 12)))
            .unwrap();

        assert_eq!(command.name(), generate::NAME);
        assert_eq!(command.command_type(), generate::COMMAND_TYPE);
        assert_eq!(command.parameters().get(generate::param::COUNT), Some(&Value::Int(12)));
    }

    #[test]
    fn test_unsupported_type_is_rejected() {
        let (_, factory) = factory();

        assert!(matches!(factory.create_command("unknown", None), Err(CommandError::UnsupportedCommandType(_))));
        assert!(!factory.is_command_type_supported("unknown"));
        assert!(factory.is_command_type_supported("validate_test_data"));
    }

    #[test]
    fn test_clear_preset_can_be_overridden() {
        let (_, factory) = factory();

        let preset = factory.clear_test_data().parameters();
        assert_eq!(preset.get(delete::param::CONFIRM_DELETE), Some(&Value::Bool(true)));

        let overridden = factory
            .create_command("CLEAR_TEST_DATA", Some(Parameters::new().with(delete::param::CONFIRM_DELETE, false)))
            .unwrap();
        assert!(overridden.execute().unwrap_err().is_validation());
    }

    #[test]
    fn test_convenience_builders_round_trip_through_the_store() {
        let (store, factory) = factory();

        factory.generate_test_data_with_layout(2, 5).execute().unwrap();
        assert_eq!(store.count().unwrap(), 10);

        let by_type = factory.delete_test_data_by_type("NOT_A_TYPE").execute().unwrap();
        assert_eq!(by_type.data_as::<i64>().unwrap(), Some(0));

        let specific = factory.delete_specific_test_data("TEST", "TEST_INV002").execute().unwrap();
        assert_eq!(specific.data_as::<i64>().unwrap(), Some(5));

        factory.delete_all_test_data().execute().unwrap();
        assert_eq!(store.count().unwrap(), 0);

        assert!(factory.validate_test_data().execute().unwrap().is_success());
    }

    #[test]
    fn test_oversized_layout_is_a_validation_error() {
        let (store, factory) = factory();
        let command = factory.generate_test_data_with_layout(1 << 32, 1 << 32);

        let error = command.execute().unwrap_err();

        assert_eq!(error.field(), Some(generate::param::COUNT));
        assert!(command.status().is_failed());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_supported_types() {
        let (_, factory) = factory();

        assert_eq!(
            factory.supported_command_types(),
            vec!["GENERATE_TEST_DATA", "DELETE_TEST_DATA", "CLEAR_TEST_DATA", "VALIDATE_TEST_DATA"]
        );
    }
}
