//! Members and order history.

use serde_json::json;
use tracing::instrument;

use mon_core::{ContactId, MemberId};

use crate::wix::WixError;
use crate::wix::types::{AccessToken, Member, MemberUpdate, Order};

use super::client::WixClient;
use super::conversions::{convert_member, convert_order};
use super::wire::{
    MemberResponse, OrderSearch, OrdersResponse, SearchOrdersRequest, UpdateMemberBody,
    UpdateMemberRequest, WireMemberContact, WireMemberProfile,
};

const CURRENT_MEMBER_PATH: &str = "/members/v1/members/my?fieldsets=FULL";
const SEARCH_ORDERS_PATH: &str = "/ecom/v1/orders/search";

impl WixClient {
    /// Get the member the access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`WixError::Auth`] if the token is not a member token.
    #[instrument(skip_all)]
    pub async fn get_current_member(&self, token: &AccessToken) -> Result<Member, WixError> {
        let response: MemberResponse = self
            .get(CURRENT_MEMBER_PATH, Some(token))
            .await
            .map_err(|e| match e {
                WixError::NotFound(_) => WixError::Auth("No member for token".to_string()),
                WixError::Api { status, .. } if status == 401 || status == 403 => {
                    WixError::Auth("Member access denied".to_string())
                }
                other => other,
            })?;
        Ok(convert_member(response.member))
    }

    /// Update the member's profile and contact details.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, update), fields(member_id = %member_id))]
    pub async fn update_current_member(
        &self,
        token: &AccessToken,
        member_id: &MemberId,
        update: MemberUpdate,
    ) -> Result<Member, WixError> {
        let body = UpdateMemberRequest {
            member: UpdateMemberBody {
                profile: WireMemberProfile {
                    nickname: update.nickname,
                },
                contact: WireMemberContact {
                    first_name: update.first_name,
                    last_name: update.last_name,
                    phones: update.phone.into_iter().collect(),
                },
            },
        };
        let path = format!("/members/v1/members/{}", urlencoding::encode(member_id.as_str()));
        let response: MemberResponse = self.patch(&path, &body, Some(token)).await?;
        Ok(convert_member(response.member))
    }

    /// Orders placed by a contact, most recent first as returned by Wix.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(contact_id = %contact_id))]
    pub async fn search_orders_for_contact(
        &self,
        token: &AccessToken,
        contact_id: &ContactId,
    ) -> Result<Vec<Order>, WixError> {
        let body = SearchOrdersRequest {
            search: OrderSearch {
                filter: json!({ "buyerInfo.contactId": { "$eq": contact_id.as_str() } }),
            },
        };
        let response: OrdersResponse = self.post(SEARCH_ORDERS_PATH, &body, Some(token)).await?;
        Ok(response.orders.into_iter().map(convert_order).collect())
    }
}
