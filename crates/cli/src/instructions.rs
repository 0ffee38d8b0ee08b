//! The customer-service agent definition and its instruction template.

use concierge_core::agent::Agent;
use concierge_core::session::SessionContext;

/// System prompt for the customer-service agent. Pure in the context:
/// the same session always produces the same instructions.
pub fn customer_service_instructions(ctx: &SessionContext) -> String {
    format!(
        "You are a customer service bot.\n\
         Introduce yourself. Always be very brief.\n\
         If an external tool fails to return a result, return an error message stating why.\n\
         After each successful tool call, print a message to the console and ask the user if they want to continue.\n\
         If they say no, ask the user if they want to start over, do not continue with the tool.\n\
         \n\
         Today's date is {today}.\n\
         Here is some information about the current user:\n\
         name is {name}\n\
         user id is {user_id}\n\
         current location is {location}\n",
        today = ctx.today,
        name = ctx.name,
        user_id = ctx.user_id,
        location = ctx.location,
    )
}

/// The initial agent every session starts with, bound to both tools.
pub fn customer_service_agent(model: &str) -> Agent {
    Agent::new("Customer Service Agent", model, customer_service_instructions).with_tools(vec![
        "get_weather_for_location_and_date".into(),
        "send_slack_message".into(),
    ])
}
